//! Raw API record to persisted row.

use chrono::{Datelike, NaiveDateTime};

use crate::api::ConversionData;
use crate::partition::parse_conversion_time;

use super::record::ConversionRecord;

/// Share of the publisher commission paid out to the user.
const USER_PAYOUT_RATE: f64 = 0.05;

/// A single record could not be transformed; the worker skips it.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("conversion {id}: bad conversion_time {value:?}: {source}")]
    Time {
        id: String,
        value: String,
        source: chrono::ParseError,
    },
    #[error("conversion {id}: bad user id in publisher_reference {value:?}")]
    Uid { id: String, value: String },
}

/// Builds the row for `data`. `now` stamps created/updated times and `atoken`
/// is the account token stored alongside every row.
///
/// `publisher_reference` is `<uid>:<app_id>`; a `u` prefix on the uid marks
/// kind 0, anything else kind 1.
pub fn to_record(
    data: &ConversionData,
    atoken: &str,
    now: NaiveDateTime,
) -> Result<ConversionRecord, TransformError> {
    let t = parse_conversion_time(&data.conversion_time).map_err(|source| TransformError::Time {
        id: data.id.clone(),
        value: data.conversion_time.clone(),
        source,
    })?;

    let (uid_str, app_id) = match data.publisher_ref.split_once(':') {
        Some((uid, rest)) => (uid, rest.split(':').next().unwrap_or_default()),
        None => ("", ""),
    };
    let (uid_str, kind) = match uid_str.strip_prefix('u') {
        Some(rest) => (rest, 0u8),
        None => (uid_str, 1u8),
    };
    let uid: i64 = uid_str.parse().map_err(|_| TransformError::Uid {
        id: data.id.clone(),
        value: data.publisher_ref.clone(),
    })?;

    let in_app = u8::from(data.advertiser_ref.contains("In-App"));

    Ok(ConversionRecord {
        conversion_id: data.id.clone(),
        conversion_time: t,
        uid,
        app_id: app_id.to_string(),
        customer_reference: data.customer_ref.clone(),
        conversion_status: data.value.status.clone(),
        conversion_value: data.value.value,
        publisher_commission: data.value.publisher_commission,
        payed_user: 0,
        pay_user_amount: data.value.publisher_commission * USER_PAYOUT_RATE,
        pay_time: t.and_utc().timestamp(),
        pay_time_day: t.day(),
        atoken: atoken.to_string(),
        kind,
        in_app,
        created_at: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ConversionValue;
    use crate::partition::parse_cli_time;

    fn data(publisher_ref: &str, time: &str) -> ConversionData {
        ConversionData {
            id: "c-1".into(),
            conversion_time: time.into(),
            publisher_ref: publisher_ref.into(),
            advertiser_ref: "Purchase In-App".into(),
            customer_ref: "cust".into(),
            value: ConversionValue {
                status: "approved".into(),
                value: 19.99,
                publisher_commission: 2.0,
            },
        }
    }

    fn now() -> NaiveDateTime {
        parse_cli_time("2017-03-01T00:00:00").unwrap()
    }

    #[test]
    fn transforms_prefixed_user() {
        let rec = to_record(&data("u42:app7", "2017-02-13 01:02:03"), "tok", now()).unwrap();
        assert_eq!(rec.uid, 42);
        assert_eq!(rec.kind, 0);
        assert_eq!(rec.app_id, "app7");
        assert_eq!(rec.in_app, 1);
        assert_eq!(rec.pay_time_day, 13);
        assert_eq!(rec.pay_time, 1_486_947_723);
        assert!((rec.pay_user_amount - 0.1).abs() < 1e-9);
        assert_eq!(rec.atoken, "tok");
        assert_eq!(rec.shard(), "conversion_201702");
    }

    #[test]
    fn transforms_plain_user_as_kind_one() {
        let mut d = data("42:app7", "2017-02-13 01:02:03");
        d.advertiser_ref = "Purchase".into();
        let rec = to_record(&d, "tok", now()).unwrap();
        assert_eq!(rec.uid, 42);
        assert_eq!(rec.kind, 1);
        assert_eq!(rec.in_app, 0);
    }

    #[test]
    fn bad_time_is_rejected() {
        let err = to_record(&data("u42:app7", "13/02/2017"), "tok", now()).unwrap_err();
        assert!(matches!(err, TransformError::Time { .. }));
    }

    #[test]
    fn bad_reference_is_rejected() {
        for r in ["", "uabc:app", "no-colon", "u:app"] {
            let err = to_record(&data(r, "2017-02-13 01:02:03"), "tok", now()).unwrap_err();
            assert!(matches!(err, TransformError::Uid { .. }), "{r}");
        }
    }
}
