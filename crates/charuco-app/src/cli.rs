use std::path::PathBuf;

use argh::FromArgs;
use charuco_target::DictionaryKind;

use crate::{config::AppConfig, error::AppError};

/// ChArUco board generation, image capture and camera calibration.
#[derive(Debug, FromArgs)]
pub struct Args {
    /// JSON configuration file, missing fields take their default
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,

    /// directory holding out/ and imgs-cal/
    #[argh(option, short = 'w')]
    pub workdir: Option<PathBuf>,

    /// print the effective configuration as JSON and exit
    #[argh(switch)]
    pub print_config: bool,

    /// board squares along x
    #[argh(option)]
    pub columns: Option<usize>,

    /// board squares along y
    #[argh(option)]
    pub rows: Option<usize>,

    /// side of a chessboard square
    #[argh(option)]
    pub square_length: Option<f64>,

    /// side of a marker
    #[argh(option)]
    pub marker_length: Option<f64>,

    /// marker dictionary: 4x4_50, 5x5_50, 6x6_50 or 6x6_100
    #[argh(option)]
    pub dictionary: Option<DictionaryKind>,

    /// marker table exported from OpenCV as JSON, overrides --dictionary
    #[argh(option)]
    pub dictionary_file: Option<PathBuf>,

    #[argh(subcommand)]
    command: Option<CommandArgs>,
}

/// The subcommands.
#[derive(Debug, FromArgs)]
#[argh(subcommand)]
pub enum CommandArgs {
    /// Render the board.
    GenerateBoard(GenerateBoardArgs),
    /// Capture images.
    Capture(CaptureArgs),
    /// Calibrate from images.
    Calibrate(CalibrateArgs),
}

/// Render a printable board to out/calibration-charuco.png.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "generate-board")]
pub struct GenerateBoardArgs {
    /// image width in pixels
    #[argh(option)]
    pub width: Option<usize>,

    /// image height in pixels
    #[argh(option)]
    pub height: Option<usize>,

    /// white margin in pixels
    #[argh(option)]
    pub margin: Option<usize>,

    /// marker border width in cells
    #[argh(option)]
    pub border_bits: Option<usize>,
}

/// Capture calibration images from a camera into imgs-cal/.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "capture")]
pub struct CaptureArgs {
    /// camera index k of /dev/video<k>
    #[argh(option)]
    pub camera: Option<usize>,

    /// number of images to save
    #[argh(option, short = 'n')]
    pub count: Option<usize>,

    /// corners a frame needs to be saved
    #[argh(option)]
    pub min_corners: Option<usize>,

    /// disable the live preview
    #[argh(switch)]
    pub no_preview: bool,
}

/// Calibrate the camera from the images in imgs-cal/.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "calibrate")]
pub struct CalibrateArgs {
    /// corners an image needs to be used
    #[argh(option)]
    pub min_corners: Option<usize>,

    /// keep k3 at zero
    #[argh(switch)]
    pub fix_k3: bool,

    /// keep the tangential coefficients at zero
    #[argh(switch)]
    pub zero_tangent_dist: bool,
}

/// The mode to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Render the board image.
    GenerateBoard,
    /// Run an interactive capture session.
    Capture,
    /// Run a batch calibration.
    Calibrate,
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

impl Args {
    /// Build the configuration and the command from the parsed arguments.
    ///
    /// The configuration file is read first and command line options
    /// override it.
    pub fn resolve(self) -> Result<(AppConfig, Option<Command>), AppError> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        set(&mut config.workdir, self.workdir);
        set(&mut config.board.columns, self.columns);
        set(&mut config.board.rows, self.rows);
        set(&mut config.board.square_length, self.square_length);
        set(&mut config.board.marker_length, self.marker_length);
        set(&mut config.board.dictionary, self.dictionary);
        set(&mut config.dictionary_file, self.dictionary_file.map(Some));

        let command = self.command.map(|command| match command {
            CommandArgs::GenerateBoard(args) => {
                set(&mut config.render.width, args.width);
                set(&mut config.render.height, args.height);
                set(&mut config.render.margin, args.margin);
                set(&mut config.render.border_bits, args.border_bits);
                Command::GenerateBoard
            }
            CommandArgs::Capture(args) => {
                set(&mut config.camera.device, args.camera);
                set(&mut config.capture.target_count, args.count);
                set(&mut config.capture.min_save_corners, args.min_corners);
                config.capture.preview &= !args.no_preview;
                Command::Capture
            }
            CommandArgs::Calibrate(args) => {
                set(&mut config.calibration.min_accept_corners, args.min_corners);
                config.calibration.solver.fix_k3 |= args.fix_k3;
                config.calibration.solver.zero_tangent_dist |= args.zero_tangent_dist;
                Command::Calibrate
            }
        });

        config.validate()?;
        Ok((config, command))
    }
}
