use crate::core::store::MountStore;
use crate::domain::model::{AnglePosition, AstronomicalPosition, Axis};
use crate::lx200::commands::Command;
use std::fmt;

pub const PRODUCT_NAME: &str = "LX200 Bridge";
const SYNC_REPLY: &str = "Coordinates     matched.        #";

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Empty,
    Literal(String),
    RightAscension {
        path: &'static str,
        value: AstronomicalPosition,
        high_precision: bool,
    },
    Declination {
        path: &'static str,
        value: AnglePosition,
        high_precision: bool,
    },
    AlignmentStatus {
        tracking: bool,
    },
}

impl Response {
    pub fn for_command(command: &Command) -> Response {
        match command {
            Command::AlignmentQuery => Response::Literal("P".to_string()),
            Command::GetRightAscension => {
                Response::right_ascension(Axis::RightAscension.current_path())
            }
            Command::GetTargetRightAscension => {
                Response::right_ascension(Axis::RightAscension.target_path())
            }
            Command::GetDeclination => Response::declination(Axis::Declination.current_path()),
            Command::GetTargetDeclination => {
                Response::declination(Axis::Declination.target_path())
            }
            Command::GetAlignmentStatus => Response::AlignmentStatus { tracking: false },
            Command::GetProductName => Response::Literal(format!("{}#", PRODUCT_NAME)),
            Command::GetFirmwareVersion => {
                Response::Literal(format!("{}#", env!("CARGO_PKG_VERSION")))
            }
            Command::SetTargetRightAscension(_) | Command::SetTargetDeclination(_) => {
                Response::Literal("1".to_string())
            }
            Command::Rejected(_) => Response::Literal("0".to_string()),
            Command::SlewToTarget | Command::SlewToTargetObject => {
                Response::Literal("0".to_string())
            }
            Command::SyncDatabase => Response::Literal(SYNC_REPLY.to_string()),
            Command::HaltAll
            | Command::HaltEastward
            | Command::HaltWestward
            | Command::HaltNorthward
            | Command::HaltSouthward
            | Command::MoveEast
            | Command::MoveWest
            | Command::MoveNorth
            | Command::MoveSouth
            | Command::SetSlewRate(_)
            | Command::ToggleHighPrecision
            | Command::Unknown(_) => Response::Empty,
        }
    }

    fn right_ascension(path: &'static str) -> Response {
        Response::RightAscension {
            path,
            value: AstronomicalPosition::default(),
            high_precision: false,
        }
    }

    fn declination(path: &'static str) -> Response {
        Response::Declination {
            path,
            value: AnglePosition::default(),
            high_precision: false,
        }
    }

    /// Copies the values this response reports from the store.
    /// Missing positions render as zero.
    pub fn fill(&mut self, store: &MountStore) {
        let precise = store.get_as::<bool>("mount.high_precision").unwrap_or(false);
        match self {
            Response::RightAscension {
                path,
                value,
                high_precision,
            } => {
                *value = store.get_as(*path).unwrap_or_default();
                *high_precision = precise;
            }
            Response::Declination {
                path,
                value,
                high_precision,
            } => {
                *value = store.get_as(*path).unwrap_or_default();
                *high_precision = precise;
            }
            Response::AlignmentStatus { tracking } => {
                *tracking = store
                    .get_as::<bool>("mount.alignment_status.is_tracking")
                    .unwrap_or(false);
            }
            Response::Empty | Response::Literal(_) => {}
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Empty => Ok(()),
            Response::Literal(text) => f.write_str(text),
            Response::RightAscension {
                value,
                high_precision,
                ..
            } => {
                let hours = value.to_decimal().rem_euclid(24.0);
                if *high_precision {
                    let total = (hours * 3600.0).round() as u32 % 86_400;
                    write!(f, "{:02}:{:02}:{:02}#", total / 3600, total % 3600 / 60, total % 60)
                } else {
                    // 以 0.1 分為單位
                    let total = (hours * 600.0).round() as u32 % 14_400;
                    write!(f, "{:02}:{:02}.{}#", total / 600, total % 600 / 10, total % 10)
                }
            }
            Response::Declination {
                value,
                high_precision,
                ..
            } => {
                let degrees = value.to_decimal();
                let sign = if degrees < 0.0 { '-' } else { '+' };
                if *high_precision {
                    let total = (degrees.abs() * 3600.0).round() as u32;
                    write!(
                        f,
                        "{}{:02}*{:02}'{:02}#",
                        sign,
                        total / 3600,
                        total % 3600 / 60,
                        total % 60
                    )
                } else {
                    let total = (degrees.abs() * 60.0).round() as u32;
                    write!(f, "{}{:02}*{:02}#", sign, total / 60, total % 60)
                }
            }
            Response::AlignmentStatus { tracking } => {
                write!(f, "P{}1#", if *tracking { 'T' } else { 'N' })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(command: Command, store: &MountStore) -> String {
        let mut response = Response::for_command(&command);
        response.fill(store);
        response.to_string()
    }

    #[test]
    fn test_right_ascension_precision() {
        let store = MountStore::new();
        store.set(
            "mount.right_ascension",
            json!({"hours": 5.0, "minutes": 35.0, "seconds": 17.0}),
        );

        assert_eq!(render(Command::GetRightAscension, &store), "05:35.3#");
        store.set("mount.high_precision", json!(true));
        assert_eq!(render(Command::GetRightAscension, &store), "05:35:17#");
    }

    #[test]
    fn test_declination_negative() {
        let store = MountStore::new();
        store.set("mount.high_precision", json!(true));
        store.set(
            "mount.declination",
            json!({"degrees": -5.0, "minutes": -23.0, "seconds": -28.0}),
        );

        assert_eq!(render(Command::GetDeclination, &store), "-05*23'28#");
    }

    #[test]
    fn test_missing_target_renders_zero() {
        let store = MountStore::new();
        assert_eq!(render(Command::GetTargetDeclination, &store), "+00*00#");
        assert_eq!(render(Command::GetTargetRightAscension, &store), "00:00.0#");
    }

    #[test]
    fn test_alignment_status_reports_tracking() {
        let store = MountStore::new();
        assert_eq!(render(Command::GetAlignmentStatus, &store), "PN1#");
        store.set("mount.alignment_status.is_tracking", json!(true));
        assert_eq!(render(Command::GetAlignmentStatus, &store), "PT1#");
    }

    #[test]
    fn test_fixed_replies() {
        let store = MountStore::new();
        assert_eq!(render(Command::AlignmentQuery, &store), "P");
        assert_eq!(render(Command::SlewToTargetObject, &store), "0");
        assert_eq!(render(Command::Rejected("Sd?".into()), &store), "0");
        assert_eq!(render(Command::MoveEast, &store), "");
        assert!(render(Command::SyncDatabase, &store).ends_with('#'));
    }
}
