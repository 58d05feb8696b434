/// Disjoint sets over the pixel indices of one image.
///
/// Union by size with path halving. The buffers are reused between images
/// through [`UnionFind::resize`].
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    /// `len` singleton sets.
    pub fn new(len: usize) -> Self {
        let mut uf = Self::default();
        uf.resize(len);
        uf
    }

    /// Start over with `len` singleton sets.
    pub fn resize(&mut self, len: usize) {
        self.parent.clear();
        self.parent.extend(0..len);
        self.size.clear();
        self.size.resize(len, 1);
    }

    /// The root of the set holding `id`.
    pub fn get_representative(&mut self, mut id: usize) -> usize {
        while self.parent[id] != id {
            let grandparent = self.parent[self.parent[id]];
            self.parent[id] = grandparent;
            id = grandparent;
        }
        id
    }

    /// Merge the sets of `a` and `b` and return the root of the union.
    pub fn connect(&mut self, a: usize, b: usize) -> usize {
        let mut big = self.get_representative(a);
        let mut small = self.get_representative(b);
        if big == small {
            return big;
        }
        if self.size[big] < self.size[small] {
            std::mem::swap(&mut big, &mut small);
        }
        self.parent[small] = big;
        self.size[big] += self.size[small];
        big
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons() {
        let mut uf = UnionFind::new(10);
        assert_eq!(uf.get_representative(0), 0);
        assert_eq!(uf.get_representative(5), 5);
    }

    #[test]
    fn chains_merge_into_the_larger_set() {
        let mut uf = UnionFind::new(10);
        for i in 0..4 {
            uf.connect(i, i + 1);
        }
        let root = uf.get_representative(4);
        assert_eq!(uf.connect(8, 2), root);
        assert_eq!(uf.size[root], 6);
        assert_eq!(uf.get_representative(8), uf.get_representative(0));
        assert_ne!(uf.get_representative(9), root);
    }

    #[test]
    fn resize_starts_over() {
        let mut uf = UnionFind::new(4);
        uf.connect(0, 1);
        uf.resize(6);
        assert!((0..6).all(|i| uf.get_representative(i) == i));
    }
}
