//! Rigid-body superposition: the optimal `(rotation, translation)` fit
//! between two sets of corresponding coordinates (Kabsch/Horn-style, via the
//! quaternion method so it shares machinery with [`crate::geometry::QuatRot`]
//! rather than pulling in a general SVD dependency), and composition of
//! pairwise superpositions along a spanning tree for a multi-structure fit.

use std::collections::{HashMap, VecDeque};

use crate::error::Error;
use crate::geometry::{Coord, QuatRot, Rotation};

/// A rigid-body transform `p -> rotation.rotate(p) + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    pub rotation: Rotation,
    pub translation: Coord,
}

impl Superposition {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            rotation: Rotation::identity(),
            translation: Coord::ZERO,
        }
    }

    #[must_use]
    pub fn apply(&self, point: Coord) -> Coord {
        self.rotation.rotate(point) + self.translation
    }

    /// The inverse transform.
    #[must_use]
    pub fn invert(&self) -> Self {
        let inverse_rotation = self.rotation.transpose();
        Self {
            rotation: inverse_rotation,
            translation: -inverse_rotation.rotate(self.translation),
        }
    }

    /// `self` applied after `inner`: `p -> self.apply(inner.apply(p))`.
    #[must_use]
    pub fn compose(&self, inner: &Self) -> Self {
        Self {
            rotation: self.rotation.compose(&inner.rotation),
            translation: self.rotation.rotate(inner.translation) + self.translation,
        }
    }

    /// The optimal rigid transform minimising `sum ||R*a_i + t - b_i||^2`
    /// over `pairs = [(a_i, b_i), ...]`, via Horn's closed-form quaternion
    /// method.
    pub fn fit(pairs: &[(Coord, Coord)]) -> Result<Self, Error> {
        if pairs.len() < 3 {
            return Err(Error::InvalidArgument(format!(
                "superposition fit needs at least 3 correspondences, got {}",
                pairs.len()
            )));
        }
        let n = pairs.len() as f64;
        let centroid_a = pairs.iter().fold(Coord::ZERO, |acc, (a, _)| acc + *a) / n;
        let centroid_b = pairs.iter().fold(Coord::ZERO, |acc, (_, b)| acc + *b) / n;
        let centred: Vec<(Coord, Coord)> = pairs
            .iter()
            .map(|(a, b)| (*a - centroid_a, *b - centroid_b))
            .collect();
        let rotation = optimal_rotation(&centred)?.to_rotation();
        let translation = centroid_b - rotation.rotate(centroid_a);
        Ok(Self { rotation, translation })
    }
}

/// Horn's quaternion method: build the 4x4 symmetric "key" matrix from the
/// cross-covariance of the centred correspondences, and find its largest
/// eigenvector via power iteration (after a diagonal shift that makes every
/// eigenvalue non-negative, so the dominant one stays the one we want,
/// mirroring the power-iteration idiom [`crate::secondary_structure::fit`]
/// already uses for the 3x3 axis-direction case).
fn optimal_rotation(centred: &[(Coord, Coord)]) -> Result<QuatRot, Error> {
    let mut s = [[0.0_f64; 3]; 3];
    for (a, b) in centred {
        let a_arr = [a.x, a.y, a.z];
        let b_arr = [b.x, b.y, b.z];
        for (row, av) in s.iter_mut().zip(a_arr) {
            for (cell, bv) in row.iter_mut().zip(b_arr) {
                *cell += av * bv;
            }
        }
    }
    let (sxx, sxy, sxz) = (s[0][0], s[0][1], s[0][2]);
    let (syx, syy, syz) = (s[1][0], s[1][1], s[1][2]);
    let (szx, szy, szz) = (s[2][0], s[2][1], s[2][2]);

    let n = [
        [sxx + syy + szz, syz - szy, szx - sxz, sxy - syx],
        [syz - szy, sxx - syy - szz, sxy + syx, szx + sxz],
        [szx - sxz, sxy + syx, -sxx + syy - szz, syz + szy],
        [sxy - syx, szx + sxz, syz + szy, -sxx - syy + szz],
    ];

    let shift: f64 = n.iter().flatten().map(|v| v.abs()).sum::<f64>() + 1.0;
    let shifted = {
        let mut m = n;
        for (i, row) in m.iter_mut().enumerate() {
            row[i] += shift;
        }
        m
    };

    let mut v = [1.0_f64, 0.0, 0.0, 0.0];
    for _ in 0..200 {
        let mut next = [0.0_f64; 4];
        for (i, row) in shifted.iter().enumerate() {
            next[i] = row.iter().zip(v).map(|(m, vi)| m * vi).sum();
        }
        let norm = next.iter().map(|c| c * c).sum::<f64>().sqrt();
        if norm < 1e-15 {
            return Err(Error::InvalidArgument(
                "superposition fit is degenerate (coincident or collinear correspondences)".into(),
            ));
        }
        for (c, nc) in v.iter_mut().zip(next) {
            *c = nc / norm;
        }
    }
    Ok(QuatRot::from_wxyz(v[0], v[1], v[2], v[3]))
}

/// Compose pairwise superpositions along a spanning tree into one
/// superposition per structure, all expressed relative to `root`.
///
/// `tree_edges` is `(a, b, superposition_a_to_b)`: the transform that best
/// maps `a`'s coordinates onto `b`'s frame. Returns `result[i]` = the
/// transform taking structure `i`'s own coordinates into `root`'s frame, or
/// `Err` if the edges do not connect every structure `0..n`.
pub fn compose_along_tree(
    n: usize,
    tree_edges: &[(usize, usize, Superposition)],
    root: usize,
) -> Result<Vec<Superposition>, Error> {
    if root >= n {
        return Err(Error::OutOfRange { index: root, bound: n });
    }
    let mut adjacency: HashMap<usize, Vec<(usize, Superposition)>> = HashMap::new();
    for (a, b, sup_a_to_b) in tree_edges {
        // Stored under `x`, keyed by neighbour `y`: the transform that maps
        // `y`'s coordinates into `x`'s frame.
        adjacency.entry(*b).or_default().push((*a, *sup_a_to_b));
        adjacency.entry(*a).or_default().push((*b, sup_a_to_b.invert()));
    }

    let mut result: Vec<Option<Superposition>> = vec![None; n];
    let mut visited = vec![false; n];
    result[root] = Some(Superposition::identity());
    visited[root] = true;
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        let to_root = result[node].expect("node was enqueued with a known transform");
        if let Some(neighbours) = adjacency.get(&node) {
            for &(next, ref neighbour_to_node) in neighbours {
                if !visited[next] {
                    visited[next] = true;
                    result[next] = Some(to_root.compose(neighbour_to_node));
                    queue.push_back(next);
                }
            }
        }
    }
    result
        .into_iter()
        .enumerate()
        .map(|(i, sup)| {
            sup.ok_or_else(|| Error::Runtime(format!("structure {i} is not connected to the root by tree_edges")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn rotate_z_90() -> Rotation {
        Rotation::new(
            Coord::new(0.0, 1.0, 0.0),
            Coord::new(-1.0, 0.0, 0.0),
            Coord::new(0.0, 0.0, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn fit_recovers_a_known_rotation_and_translation() {
        let rotation = rotate_z_90();
        let translation = Coord::new(5.0, -2.0, 1.0);
        let points_a = [
            Coord::new(1.0, 0.0, 0.0),
            Coord::new(0.0, 2.0, 0.0),
            Coord::new(0.0, 0.0, 3.0),
            Coord::new(1.0, 1.0, 1.0),
        ];
        let pairs: Vec<(Coord, Coord)> = points_a
            .iter()
            .map(|&a| (a, rotation.rotate(a) + translation))
            .collect();
        let fitted = Superposition::fit(&pairs).unwrap();
        for &a in &points_a {
            let expected = rotation.rotate(a) + translation;
            let got = fitted.apply(a);
            assert!((got - expected).length() < 1e-6);
        }
        let _ = FRAC_PI_2;
    }

    #[test]
    fn too_few_correspondences_is_rejected() {
        let pairs = [(Coord::ZERO, Coord::ZERO), (Coord::X, Coord::X)];
        assert!(Superposition::fit(&pairs).is_err());
    }

    #[test]
    fn invert_undoes_apply() {
        let rotation = rotate_z_90();
        let sup = Superposition {
            rotation,
            translation: Coord::new(1.0, 2.0, 3.0),
        };
        let p = Coord::new(4.0, -1.0, 0.5);
        let round_tripped = sup.invert().apply(sup.apply(p));
        assert!((round_tripped - p).length() < 1e-9);
    }

    #[test]
    fn compose_along_tree_chains_transforms() {
        // 0 -- 1 -- 2, each edge a pure translation.
        let sup_01 = Superposition {
            rotation: Rotation::identity(),
            translation: Coord::new(1.0, 0.0, 0.0),
        };
        let sup_12 = Superposition {
            rotation: Rotation::identity(),
            translation: Coord::new(0.0, 1.0, 0.0),
        };
        let result = compose_along_tree(3, &[(0, 1, sup_01), (1, 2, sup_12)], 0).unwrap();
        assert_eq!(result[0], Superposition::identity());
        assert!((result[1].apply(Coord::ZERO) - Coord::new(1.0, 0.0, 0.0)).length() < 1e-9);
        // node 2's transform into root's frame: since sup_12 maps 1 -> 2's
        // frame, the inverse maps 2 -> 1's frame, and composing with 0->1
        // gives 2 -> 0's frame.
        assert!((result[2].apply(Coord::ZERO) - Coord::new(1.0, -1.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn disconnected_tree_is_rejected() {
        let sup = Superposition::identity();
        assert!(compose_along_tree(3, &[(0, 1, sup)], 0).is_err());
    }
}
