//! Route lifecycle status shared by the mobility, dispatch, and output crates.

/// Where an `ActiveRoute` is in its round trip.
///
/// The discriminants are the integer status codes published to observers.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum RouteStatus {
    /// Outbound leg from the warehouse toward a random destination.
    #[default]
    EnRoute = 0,
    /// Return leg from the destination back to the warehouse.
    Returning = 1,
    /// Outbound leg finished; waiting for a return path.
    AtDestination = 2,
    /// Return leg finished; the route is ready to be reclaimed.
    Complete = 3,
}

impl RouteStatus {
    /// Integer code for observers (`statusCode` attribute).
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(RouteStatus::EnRoute),
            1 => Some(RouteStatus::Returning),
            2 => Some(RouteStatus::AtDestination),
            3 => Some(RouteStatus::Complete),
            _ => None,
        }
    }

    /// `true` for states in which the vehicle is travelling along its path.
    #[inline]
    pub fn is_moving(self) -> bool {
        matches!(self, RouteStatus::EnRoute | RouteStatus::Returning)
    }

    /// `true` for states that end a leg and need the fleet manager to act.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, RouteStatus::AtDestination | RouteStatus::Complete)
    }

    /// Position within the round trip, used to check that a route never
    /// moves backwards: EnRoute → AtDestination → Returning → Complete.
    #[inline]
    pub fn stage(self) -> u8 {
        match self {
            RouteStatus::EnRoute       => 0,
            RouteStatus::AtDestination => 1,
            RouteStatus::Returning     => 2,
            RouteStatus::Complete      => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RouteStatus::EnRoute       => "en_route",
            RouteStatus::Returning     => "returning",
            RouteStatus::AtDestination => "at_destination",
            RouteStatus::Complete      => "complete",
        }
    }
}

impl std::fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
