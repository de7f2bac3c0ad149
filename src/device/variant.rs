//! Manufacturer-specific device behavior. The variant set is a closed
//! enum selected by an explicit lookup, so every supported special case is
//! auditable here; only the unlock gesture and one construction-time side
//! effect differ between variants.

use crate::models::{Orientation, SwipeCoords};

/// Package whose multi-window overlay intercepts injected input on
/// samsung-like devices; it is force-stopped and blocked at construction.
pub const MULTI_WINDOW_PACKAGE: &str = "com.sec.android.app.FlashBarService";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Variant {
    #[default]
    Default,
    KindleLike,
    SamsungLike,
}

impl Variant {
    /// Case-insensitive lookup from the reported manufacturer. Unknown or
    /// absent manufacturers get the default behavior.
    pub fn from_manufacturer(manufacturer: Option<&str>) -> Self {
        match manufacturer.map(str::to_lowercase).as_deref() {
            Some("amazon") => Variant::KindleLike,
            Some("samsung") => Variant::SamsungLike,
            _ => Variant::Default,
        }
    }
}

/// Unlock swipe for kindle-like devices, where the wake-up key event alone
/// does not clear the keyguard. Pre-5.0 builds unlock with a horizontal
/// swipe near the vertical center; 5.0+ builds swipe vertically, with the
/// start point picked for the current orientation.
pub fn kindle_unlock_gesture(
    resolution: (u32, u32),
    version_major: u32,
    orientation: Orientation,
) -> SwipeCoords {
    let (width, height) = resolution;
    if version_major < 5 {
        return SwipeCoords {
            x_from: width * 3 / 4,
            y_from: height / 2,
            x_to: width / 4,
            y_to: height / 2,
        };
    }
    match orientation {
        Orientation::Landscape => SwipeCoords {
            x_from: width / 2,
            y_from: height * 3 / 4,
            x_to: width / 2,
            y_to: height / 4,
        },
        Orientation::Portrait => SwipeCoords {
            x_from: width / 4,
            y_from: height / 2,
            x_to: width / 4,
            y_to: height / 3,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(Variant::from_manufacturer(Some("Amazon")), Variant::KindleLike);
        assert_eq!(Variant::from_manufacturer(Some("SAMSUNG")), Variant::SamsungLike);
        assert_eq!(Variant::from_manufacturer(Some("samsung")), Variant::SamsungLike);
    }

    #[test]
    fn unknown_or_absent_manufacturer_is_default() {
        assert_eq!(Variant::from_manufacturer(Some("HTC")), Variant::Default);
        assert_eq!(Variant::from_manufacturer(None), Variant::Default);
        assert_eq!(Variant::from_manufacturer(Some("")), Variant::Default);
    }

    #[test]
    fn old_builds_swipe_horizontally() {
        let coords = kindle_unlock_gesture((1200, 800), 4, Orientation::Portrait);
        assert_eq!(coords.y_from, coords.y_to);
        assert!(coords.x_from > coords.x_to);
    }

    #[test]
    fn new_builds_swipe_vertically_by_orientation() {
        let portrait = kindle_unlock_gesture((1080, 1920), 5, Orientation::Portrait);
        assert_eq!(portrait.x_from, portrait.x_to);
        assert!(portrait.y_from > portrait.y_to);

        let landscape = kindle_unlock_gesture((1920, 1080), 6, Orientation::Landscape);
        assert_eq!(landscape.x_from, landscape.x_to);
        assert!(landscape.y_from > landscape.y_to);
    }
}
