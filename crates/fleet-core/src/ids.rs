//! Identifier types.
//!
//! `WarehouseId` is a zero-cost typed index, like every other integer id in
//! the workspace.  `RouteId` is different: it is the entity id published to
//! observers, so it is a short random alphanumeric code rather than a
//! sequence number.

use std::fmt;

use rand::Rng;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a warehouse in the loaded `WarehouseSet`.
    pub struct WarehouseId(u32);
}

// ── RouteId ───────────────────────────────────────────────────────────────────

/// Symbols a `RouteId` is drawn from: 36 upper-case alphanumerics.
pub const ROUTE_ID_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of every `RouteId`.
pub const ROUTE_ID_LEN: usize = 6;

/// Random 6-character entity id, e.g. `"K3Q9ZA"`.
///
/// 36^6 ≈ 2.2 billion possible values.  Stored inline so the id is `Copy`
/// and cheap to use as a map key.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId([u8; ROUTE_ID_LEN]);

impl RouteId {
    /// Draw a fresh id from `rng`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut code = [0u8; ROUTE_ID_LEN];
        for c in &mut code {
            *c = ROUTE_ID_ALPHABET[rng.gen_range(0..ROUTE_ID_ALPHABET.len())];
        }
        RouteId(code)
    }

    /// Draw ids until one is not rejected by `in_use`.
    pub fn generate_unique<R, F>(rng: &mut R, mut in_use: F) -> Self
    where
        R: Rng + ?Sized,
        F: FnMut(&RouteId) -> bool,
    {
        loop {
            let id = Self::generate(rng);
            if !in_use(&id) {
                return id;
            }
        }
    }

    /// Parse an id, accepting only the 6-symbol alphabet.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != ROUTE_ID_LEN || !bytes.iter().all(|b| ROUTE_ID_ALPHABET.contains(b)) {
            return None;
        }
        let mut code = [0u8; ROUTE_ID_LEN];
        code.copy_from_slice(bytes);
        Some(RouteId(code))
    }

    pub fn as_str(&self) -> &str {
        // Only ever built from ASCII alphabet bytes.
        std::str::from_utf8(&self.0).unwrap_or("??????")
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteId({})", self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RouteId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
