//! Integer voxel coordinates

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::IVec3;

/// Integer position of a single voxel.
///
/// Equality, hashing and ordering are derived from the three components, so
/// two coordinates are the same graph node exactly when their canonical key
/// (`x,y,z`) matches. Ordering is x, then y, then z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Coordinate shifted by the given offsets
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Coordinate directly above
    pub const fn up(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Horizontal column this coordinate belongs to, as (x, z)
    pub const fn column(self) -> (i32, i32) {
        (self.x, self.z)
    }

    /// Chebyshev distance (largest per-axis difference)
    pub fn chebyshev(self, other: Coord) -> i32 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }

    /// True when `other` is one of the 26 surrounding voxels
    pub fn is_adjacent(self, other: Coord) -> bool {
        self.chebyshev(other) == 1
    }

    /// Canonical serialized key
    pub fn key(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl FromStr for Coord {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(|p| p.trim().parse::<i32>());
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Ok(Coord::new(x, y, z)),
            _ => Err(Error::Parse(format!("invalid coordinate key '{}'", s))),
        }
    }
}

impl From<IVec3> for Coord {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Coord> for IVec3 {
    fn from(c: Coord) -> Self {
        IVec3::new(c.x, c.y, c.z)
    }
}

impl From<(i32, i32, i32)> for Coord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        let c = Coord::new(-3, 64, 12);
        assert_eq!(c.key(), "-3,64,12");
        assert_eq!("-3,64,12".parse::<Coord>().unwrap(), c);
        assert_eq!(" 1, 2 ,3".parse::<Coord>().unwrap(), Coord::new(1, 2, 3));
    }

    #[test]
    fn test_bad_key() {
        assert!("1,2".parse::<Coord>().is_err());
        assert!("1,2,3,4".parse::<Coord>().is_err());
        assert!("a,b,c".parse::<Coord>().is_err());
    }

    #[test]
    fn test_adjacency() {
        let c = Coord::new(0, 0, 0);
        assert!(c.is_adjacent(Coord::new(1, 1, 1)));
        assert!(c.is_adjacent(Coord::new(0, -1, 0)));
        assert!(!c.is_adjacent(c));
        assert!(!c.is_adjacent(Coord::new(2, 0, 0)));
    }

    #[test]
    fn test_ordering_is_x_then_y_then_z() {
        let mut coords = vec![
            Coord::new(1, 0, 0),
            Coord::new(0, 1, 0),
            Coord::new(0, 0, 1),
            Coord::new(0, 0, 0),
        ];
        coords.sort();
        assert_eq!(
            coords,
            vec![
                Coord::new(0, 0, 0),
                Coord::new(0, 0, 1),
                Coord::new(0, 1, 0),
                Coord::new(1, 0, 0),
            ]
        );
    }

    #[test]
    fn test_glam_conversion() {
        let v = IVec3::new(4, 5, 6);
        let c: Coord = v.into();
        assert_eq!(IVec3::from(c), v);
    }
}
