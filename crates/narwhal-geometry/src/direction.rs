use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use crate::epsilon;
use crate::{Point, Vector, vector};

/// Set of compass directions. A single bit is a *pure* direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Directions(u8);

impl Directions {
    pub const NONE: Self = Self(0);
    pub const NORTH: Self = Self(1);
    pub const EAST: Self = Self(2);
    pub const SOUTH: Self = Self(4);
    pub const WEST: Self = Self(8);
    pub const ALL: Self = Self(15);

    /// The pure directions in clockwise order starting at north.
    pub const PURE: [Self; 4] = [Self::NORTH, Self::EAST, Self::SOUTH, Self::WEST];

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn is_pure(self) -> bool {
        self.0.count_ones() == 1
    }

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_vertical(self) -> bool {
        self == Self::NORTH || self == Self::SOUTH
    }

    pub fn is_horizontal(self) -> bool {
        self == Self::EAST || self == Self::WEST
    }

    /// Index of a pure direction in [`Directions::PURE`].
    pub fn index(self) -> Option<usize> {
        match self {
            Self::NORTH => Some(0),
            Self::EAST => Some(1),
            Self::SOUTH => Some(2),
            Self::WEST => Some(3),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        let mut out = Self::NONE;
        if self.0 & Self::NORTH.0 != 0 {
            out |= Self::SOUTH;
        }
        if self.0 & Self::SOUTH.0 != 0 {
            out |= Self::NORTH;
        }
        if self.0 & Self::EAST.0 != 0 {
            out |= Self::WEST;
        }
        if self.0 & Self::WEST.0 != 0 {
            out |= Self::EAST;
        }
        out
    }

    pub fn rotate_right(self) -> Self {
        Self(((self.0 << 1) | (self.0 >> 3)) & 15)
    }

    pub fn rotate_left(self) -> Self {
        Self(((self.0 >> 1) | (self.0 << 3)) & 15)
    }

    /// Directions needed to move from `a` to `b`; axes within the distance epsilon are
    /// treated as aligned.
    pub fn between(a: Point, b: Point) -> Self {
        let mut out = Self::NONE;
        match epsilon::compare(b.x, a.x) {
            std::cmp::Ordering::Greater => out |= Self::EAST,
            std::cmp::Ordering::Less => out |= Self::WEST,
            std::cmp::Ordering::Equal => {}
        }
        match epsilon::compare(b.y, a.y) {
            std::cmp::Ordering::Greater => out |= Self::NORTH,
            std::cmp::Ordering::Less => out |= Self::SOUTH,
            std::cmp::Ordering::Equal => {}
        }
        out
    }

    /// Unit step of a pure direction; zero for anything else.
    pub fn unit_vector(self) -> Vector {
        match self {
            Self::NORTH => vector(0.0, 1.0),
            Self::EAST => vector(1.0, 0.0),
            Self::SOUTH => vector(0.0, -1.0),
            Self::WEST => vector(-1.0, 0.0),
            _ => vector(0.0, 0.0),
        }
    }

    pub fn iter(self) -> impl Iterator<Item = Self> {
        Self::PURE.into_iter().filter(move |d| self.contains(*d))
    }
}

impl BitOr for Directions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Directions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Directions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for Directions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("None");
        }
        let names = ["North", "East", "South", "West"];
        let mut first = true;
        for (i, d) in Self::PURE.iter().enumerate() {
            if self.contains(*d) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(names[i])?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point;

    #[test]
    fn rotation_cycles_through_the_compass() {
        assert_eq!(Directions::NORTH.rotate_right(), Directions::EAST);
        assert_eq!(Directions::WEST.rotate_right(), Directions::NORTH);
        assert_eq!(Directions::NORTH.rotate_left(), Directions::WEST);
        assert_eq!(Directions::EAST.opposite(), Directions::WEST);
    }

    #[test]
    fn between_ignores_sub_epsilon_offsets() {
        let d = Directions::between(point(0.0, 0.0), point(5.0, 1e-9));
        assert_eq!(d, Directions::EAST);
        let d = Directions::between(point(0.0, 0.0), point(-5.0, 3.0));
        assert_eq!(d, Directions::WEST | Directions::NORTH);
        assert_eq!(d.to_string(), "North|West");
    }
}
