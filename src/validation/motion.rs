use serde::Serialize;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Motion {
    Parallel,
    Similar,
    Oblique,
    Contrary,
}

impl Motion {
    pub fn name(self) -> &'static str {
        match self {
            Motion::Parallel => "parallel",
            Motion::Similar => "similar",
            Motion::Oblique => "oblique",
            Motion::Contrary => "contrary",
        }
    }
}

/// Classify the motion between two consecutive simultaneities.
///
/// Both voices holding is reported as oblique. Only an identical signed move
/// in both voices is parallel; a fifth opening to a twelfth is similar.
pub fn classify_motion(cf_prev: i32, cf_curr: i32, cp_prev: i32, cp_curr: i32) -> Motion {
    let cf_delta = cf_curr - cf_prev;
    let cp_delta = cp_curr - cp_prev;

    if cf_delta == 0 || cp_delta == 0 {
        return Motion::Oblique;
    }

    if cf_delta.signum() != cp_delta.signum() {
        return Motion::Contrary;
    }

    if cf_delta == cp_delta {
        Motion::Parallel
    } else {
        Motion::Similar
    }
}
