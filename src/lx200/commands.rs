use crate::core::store::MountStore;
use crate::domain::model::{AnglePosition, AstronomicalPosition, SlewRate};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Single ACK byte (0x06), asks for the mount alignment mode.
    AlignmentQuery,
    GetRightAscension,
    GetDeclination,
    GetTargetRightAscension,
    GetTargetDeclination,
    GetAlignmentStatus,
    GetProductName,
    GetFirmwareVersion,
    SetTargetRightAscension(AstronomicalPosition),
    SetTargetDeclination(AnglePosition),
    SlewToTarget,
    SlewToTargetObject,
    SyncDatabase,
    HaltAll,
    HaltEastward,
    HaltWestward,
    HaltNorthward,
    HaltSouthward,
    MoveEast,
    MoveWest,
    MoveNorth,
    MoveSouth,
    SetSlewRate(SlewRate),
    ToggleHighPrecision,
    /// Known command with an argument that could not be parsed.
    Rejected(String),
    Unknown(String),
}

impl Command {
    /// Parses a frame body, i.e. the text between `:` and `#`.
    pub fn parse(body: &str) -> Command {
        match body {
            "GR" => Command::GetRightAscension,
            "GD" => Command::GetDeclination,
            "Gr" => Command::GetTargetRightAscension,
            "Gd" => Command::GetTargetDeclination,
            "GW" => Command::GetAlignmentStatus,
            "GVP" => Command::GetProductName,
            "GVN" => Command::GetFirmwareVersion,
            "MA" => Command::SlewToTarget,
            "MS" => Command::SlewToTargetObject,
            "CM" => Command::SyncDatabase,
            "Q" => Command::HaltAll,
            "Qe" => Command::HaltEastward,
            "Qw" => Command::HaltWestward,
            "Qn" => Command::HaltNorthward,
            "Qs" => Command::HaltSouthward,
            "Me" => Command::MoveEast,
            "Mw" => Command::MoveWest,
            "Mn" => Command::MoveNorth,
            "Ms" => Command::MoveSouth,
            "RS" => Command::SetSlewRate(SlewRate::Max),
            "RM" => Command::SetSlewRate(SlewRate::Finding),
            "RC" => Command::SetSlewRate(SlewRate::Centering),
            "RG" => Command::SetSlewRate(SlewRate::Guiding),
            "U" => Command::ToggleHighPrecision,
            _ => {
                if let Some(arg) = body.strip_prefix("Sr") {
                    parse_right_ascension(arg)
                        .map(Command::SetTargetRightAscension)
                        .unwrap_or_else(|| Command::Rejected(body.to_string()))
                } else if let Some(arg) = body.strip_prefix("Sd") {
                    parse_declination(arg)
                        .map(Command::SetTargetDeclination)
                        .unwrap_or_else(|| Command::Rejected(body.to_string()))
                } else {
                    Command::Unknown(body.to_string())
                }
            }
        }
    }

    /// Partial state tree written by this command, if it writes plain values.
    pub fn store_patch(&self) -> Option<Value> {
        match self {
            Command::SetTargetRightAscension(ra) => {
                Some(json!({"mount": {"target": {"right_ascension": ra}}}))
            }
            Command::SetTargetDeclination(dec) => {
                Some(json!({"mount": {"target": {"declination": dec}}}))
            }
            Command::SetSlewRate(rate) => Some(json!({"mount": {"slew": {"rate": rate}}})),
            _ => None,
        }
    }

    pub fn commit(&self, store: &MountStore) {
        if let Command::ToggleHighPrecision = self {
            let current = store.get_as::<bool>("mount.high_precision").unwrap_or(false);
            store.set("mount.high_precision", Value::Bool(!current));
            return;
        }

        if let Some(patch) = self.store_patch() {
            store.update(patch);
        }
    }
}

/// `HH:MM:SS` or the low precision `HH:MM.T`.
pub fn parse_right_ascension(text: &str) -> Option<AstronomicalPosition> {
    let mut fields = text.trim().split(':');
    let hours: u32 = fields.next()?.trim().parse().ok()?;
    let minutes_field = fields.next()?.trim();

    let (minutes, seconds) = match fields.next() {
        Some(seconds) => (minutes_field.parse::<u32>().ok()?, seconds.trim().parse::<u32>().ok()?),
        None => {
            let (minutes, tenths) = minutes_field.split_once('.')?;
            let tenths: u32 = tenths.parse().ok()?;
            if tenths > 9 {
                return None;
            }
            (minutes.parse::<u32>().ok()?, tenths * 6)
        }
    };

    if fields.next().is_some() || hours >= 24 || minutes >= 60 || seconds >= 60 {
        return None;
    }

    Some(AstronomicalPosition::new(
        hours as f64,
        minutes as f64,
        seconds as f64,
    ))
}

/// `sDD*MM:SS` or `sDD*MM`. The degree mark may also be `:` or 0xDF.
/// The sign applies to every component.
pub fn parse_declination(text: &str) -> Option<AnglePosition> {
    let text = text.trim();
    let (sign, digits) = if let Some(rest) = text.strip_prefix('-') {
        (-1.0, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (1.0, rest)
    } else {
        (1.0, text)
    };

    let mut fields = digits.split(|c: char| matches!(c, '*' | ':' | '\'' | '\u{df}'));
    let degrees: u32 = fields.next()?.trim().parse().ok()?;
    let minutes: u32 = fields.next()?.trim().parse().ok()?;
    let seconds: u32 = match fields.next() {
        Some(field) => field.trim().parse().ok()?,
        None => 0,
    };

    if fields.next().is_some() || degrees > 90 || minutes >= 60 || seconds >= 60 {
        return None;
    }

    Some(AnglePosition::new(
        degrees as f64 * sign,
        minutes as f64 * sign,
        seconds as f64 * sign,
    ))
}
