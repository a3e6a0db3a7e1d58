use serde::{Deserialize, Serialize};

/// Which keys drive a top-down mover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlScheme {
    #[default]
    Wasd,
    Arrows,
}

impl ControlScheme {
    /// Key names for (up, down, left, right).
    pub fn keys(self) -> [&'static str; 4] {
        match self {
            Self::Wasd => ["w", "s", "a", "d"],
            Self::Arrows => ["ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight"],
        }
    }
}

/// A configurable capability attached to a template object.
///
/// Configuration only. Per-instance runtime state lives in the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Behavior {
    TopDownMovement {
        speed: f64,
        #[serde(default)]
        acceleration: f64,
        #[serde(default)]
        deceleration: f64,
        #[serde(default = "default_true")]
        allow_diagonals: bool,
        #[serde(default)]
        control_scheme: ControlScheme,
    },
    Bullet {
        speed: f64,
        #[serde(default)]
        destroy_on_collision: bool,
        lifespan: f64,
    },
    Turret {
        fire_rate: f64,
        bullet_object_name: String,
        #[serde(default)]
        spawn_point: String,
        #[serde(default)]
        auto_fire: bool,
    },
    RotateTowardsMouse {
        #[serde(default)]
        rotation_speed: f64,
        #[serde(default)]
        offset: f64,
    },
    Health {
        max_health: f64,
        #[serde(default)]
        current_health: f64,
    },
    Button,
}

fn default_true() -> bool {
    true
}

/// Discriminant of [`Behavior`], used to key runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    TopDownMovement,
    Bullet,
    Turret,
    RotateTowardsMouse,
    Health,
    Button,
}

impl Behavior {
    pub fn kind(&self) -> BehaviorKind {
        match self {
            Self::TopDownMovement { .. } => BehaviorKind::TopDownMovement,
            Self::Bullet { .. } => BehaviorKind::Bullet,
            Self::Turret { .. } => BehaviorKind::Turret,
            Self::RotateTowardsMouse { .. } => BehaviorKind::RotateTowardsMouse,
            Self::Health { .. } => BehaviorKind::Health,
            Self::Button => BehaviorKind::Button,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turret_from_authored_json() {
        let b: Behavior = serde_json::from_str(
            r#"{"type":"turret","fireRate":2,"bulletObjectName":"Bullet","spawnPoint":"muzzle","autoFire":true}"#,
        )
        .unwrap();
        assert_eq!(b.kind(), BehaviorKind::Turret);
        match b {
            Behavior::Turret {
                fire_rate,
                bullet_object_name,
                auto_fire,
                ..
            } => {
                assert_eq!(fire_rate, 2.0);
                assert_eq!(bullet_object_name, "Bullet");
                assert!(auto_fire);
            }
            other => panic!("unexpected behavior {other:?}"),
        }
    }

    #[test]
    fn button_has_no_fields() {
        let b: Behavior = serde_json::from_str(r#"{"type":"button"}"#).unwrap();
        assert_eq!(b, Behavior::Button);
    }

    #[test]
    fn movement_defaults() {
        let b: Behavior =
            serde_json::from_str(r#"{"type":"top_down_movement","speed":100}"#).unwrap();
        match b {
            Behavior::TopDownMovement {
                allow_diagonals,
                control_scheme,
                ..
            } => {
                assert!(allow_diagonals);
                assert_eq!(control_scheme, ControlScheme::Wasd);
            }
            other => panic!("unexpected behavior {other:?}"),
        }
    }

    #[test]
    fn arrow_keys() {
        assert_eq!(ControlScheme::Arrows.keys()[3], "ArrowRight");
    }
}
