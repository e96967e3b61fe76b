use serde::{Deserialize, Serialize};
use time::macros::{datetime, format_description, offset};
use time::{OffsetDateTime, PrimitiveDateTime};


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtcDateTime(PrimitiveDateTime);

impl UtcDateTime {
    pub const UNIX_EPOCH: Self = Self(datetime!(1970-01-01 0:00));

    pub fn now() -> Self { OffsetDateTime::now_utc().into() }

    // "2024.03.17". PGN uses question marks for unknown date parts.
    pub fn pgn_date(self) -> String {
        self.0
            .format(format_description!("[year].[month].[day]"))
            .unwrap_or_else(|_| "????.??.??".to_owned())
    }

    // "14:05:09"
    pub fn pgn_time(self) -> String {
        self.0
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_else(|_| "??:??:??".to_owned())
    }
}

impl From<PrimitiveDateTime> for UtcDateTime {
    fn from(pdt: PrimitiveDateTime) -> Self { Self(pdt) }
}
impl From<OffsetDateTime> for UtcDateTime {
    fn from(odt: OffsetDateTime) -> Self {
        let utc = odt.to_offset(offset!(UTC));
        Self::from(PrimitiveDateTime::new(utc.date(), utc.time()))
    }
}

impl From<UtcDateTime> for OffsetDateTime {
    fn from(udt: UtcDateTime) -> Self { udt.0.assume_utc() }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pgn_formatting() {
        let t = UtcDateTime::from(datetime!(2024-03-07 9:05:01));
        assert_eq!(t.pgn_date(), "2024.03.07");
        assert_eq!(t.pgn_time(), "09:05:01");
        assert_eq!(UtcDateTime::UNIX_EPOCH.pgn_date(), "1970.01.01");
    }

    #[test]
    fn offset_is_converted_to_utc() {
        let t = UtcDateTime::from(datetime!(2024-03-07 1:30 +3));
        assert_eq!(t, UtcDateTime::from(datetime!(2024-03-06 22:30)));
    }
}
