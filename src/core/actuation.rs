//! Pure translation from commands to axis server calls.
//!
//! A [`Command`] resolves to at most one [`Intent`]; an intent, the current
//! store and the configured axis ids resolve to the [`AxisCall`]s to send.
//! Nothing here touches the network.

use crate::core::store::MountStore;
use crate::domain::model::{Axis, AxisIds, Direction, RunSpeed, SlewRate};
use crate::lx200::Command;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Goto,
    Sync,
    HaltAll,
    HaltSlew(Axis),
    SlewRelative(Axis, Direction),
}

impl Intent {
    pub fn for_command(command: &Command) -> Option<Intent> {
        match command {
            Command::SlewToTarget | Command::SlewToTargetObject => Some(Intent::Goto),
            Command::SyncDatabase => Some(Intent::Sync),
            Command::HaltAll => Some(Intent::HaltAll),
            Command::HaltEastward | Command::HaltWestward => {
                Some(Intent::HaltSlew(Axis::RightAscension))
            }
            Command::HaltNorthward | Command::HaltSouthward => {
                Some(Intent::HaltSlew(Axis::Declination))
            }
            Command::MoveEast => Some(Intent::SlewRelative(
                Axis::RightAscension,
                Direction::Positive,
            )),
            Command::MoveWest => Some(Intent::SlewRelative(
                Axis::RightAscension,
                Direction::Negative,
            )),
            Command::MoveNorth => Some(Intent::SlewRelative(
                Axis::Declination,
                Direction::Positive,
            )),
            Command::MoveSouth => Some(Intent::SlewRelative(
                Axis::Declination,
                Direction::Negative,
            )),
            _ => None,
        }
    }

    pub fn plan(&self, store: &MountStore, axes: &AxisIds) -> Vec<AxisCall> {
        match self {
            Intent::Goto => plan_positioning(Positioning::Goto, store, axes),
            Intent::Sync => plan_positioning(Positioning::Sync, store, axes),
            Intent::HaltAll => vec![
                AxisCall::halt(axes.id_for(Axis::RightAscension)),
                AxisCall::halt(axes.id_for(Axis::Declination)),
            ],
            Intent::HaltSlew(axis) => vec![AxisCall::halt_axis_slew(axes.id_for(*axis))],
            Intent::SlewRelative(axis, direction) => {
                let rate = store
                    .get_as::<SlewRate>("mount.slew.rate")
                    .unwrap_or_default();
                vec![AxisCall::slew_relative(axes.id_for(*axis), rate, *direction)]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positioning {
    Goto,
    Sync,
}

impl Positioning {
    fn as_str(&self) -> &'static str {
        match self {
            Positioning::Goto => "goto",
            Positioning::Sync => "sync",
        }
    }
}

/// One call per axis whose target exists in the store.
pub fn plan_positioning(kind: Positioning, store: &MountStore, axes: &AxisIds) -> Vec<AxisCall> {
    [Axis::RightAscension, Axis::Declination]
        .into_iter()
        .filter_map(|axis| {
            let target = store.get(axis.target_path())?;
            Some(AxisCall::positioning(kind, axes.id_for(axis), axis, target))
        })
        .collect()
}

/// `PUT {server}/api/devices/{axis_id}/{action}` with an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisCall {
    pub axis_id: String,
    pub action: String,
    pub body: Option<Value>,
}

impl AxisCall {
    pub fn positioning(kind: Positioning, axis_id: &str, axis: Axis, target: Value) -> Self {
        Self {
            axis_id: axis_id.to_string(),
            action: format!("{}/{}", kind.as_str(), axis.coordinate_kind()),
            body: Some(target),
        }
    }

    pub fn halt(axis_id: &str) -> Self {
        Self {
            axis_id: axis_id.to_string(),
            action: "halt".to_string(),
            body: None,
        }
    }

    /// Stops continuous slewing without a full halt.
    pub fn halt_axis_slew(axis_id: &str) -> Self {
        Self::run_speed(axis_id, RunSpeed::zero())
    }

    pub fn slew_relative(axis_id: &str, rate: SlewRate, direction: Direction) -> Self {
        Self::run_speed(axis_id, rate.offset().scaled(direction))
    }

    fn run_speed(axis_id: &str, speed: RunSpeed) -> Self {
        Self {
            axis_id: axis_id.to_string(),
            action: "run_speed".to_string(),
            body: Some(serde_json::json!({
                "degrees": speed.degrees,
                "minutes": speed.minutes,
                "seconds": speed.seconds,
            })),
        }
    }

    pub fn path(&self) -> String {
        format!("/api/devices/{}/{}", self.axis_id, self.action)
    }
}
