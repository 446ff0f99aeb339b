//! Tickets bought for an enrolled trip

use crate::core::filter::{FilterSet, RangeBound, equals, within};
use crate::core::query::{FilterCriteria, RawQuery};
use crate::impl_resource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(default)]
    pub id: i64,

    pub user_id: Uuid,

    pub vehicle_enrollment_id: i64,

    #[serde(default = "Utc::now")]
    pub purchase_date_time_utc: DateTime<Utc>,

    #[serde(default)]
    pub is_returned: bool,

    #[serde(default)]
    pub is_missed: bool,
}

impl_resource!(
    Ticket,
    "ticket",
    "tickets",
    "id,userId,vehicleEnrollmentId,purchaseDateTimeUtc,isReturned,isMissed",
    fields {
        "id" => id,
        "userId" => user_id,
        "vehicleEnrollmentId" => vehicle_enrollment_id,
        "purchaseDateTimeUtc" => purchase_date_time_utc,
        "isReturned" => is_returned,
        "isMissed" => is_missed,
    }
);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketCriteria {
    pub user_id: Option<Uuid>,
    pub vehicle_enrollment_id: Option<i64>,
    pub purchase: Option<RangeBound<DateTime<Utc>>>,
    pub is_returned: Option<bool>,
    pub is_missed: Option<bool>,
}

impl FilterCriteria for TicketCriteria {
    type Target = Ticket;

    fn from_query(query: &RawQuery) -> Self {
        Self {
            user_id: query.uuid("userId"),
            vehicle_enrollment_id: query.i64("vehicleEnrollmentId"),
            purchase: RangeBound::from_options(
                query.datetime("fromPurchaseDateTime"),
                query.datetime("toPurchaseDateTime"),
            ),
            is_returned: query.bool("isReturned"),
            is_missed: query.bool("isMissed"),
        }
    }

    fn into_filter(self) -> FilterSet<Ticket> {
        FilterSet::new()
            .clause_if("userId", self.user_id, |id| equals(|t: &Ticket| t.user_id, id))
            .clause_if("vehicleEnrollmentId", self.vehicle_enrollment_id, |id| {
                equals(|t: &Ticket| t.vehicle_enrollment_id, id)
            })
            .clause_if("purchaseDateTime", self.purchase, |range| {
                within(|t: &Ticket| t.purchase_date_time_utc, range)
            })
            .clause_if("isReturned", self.is_returned, |flag| {
                equals(|t: &Ticket| t.is_returned, flag)
            })
            .clause_if("isMissed", self.is_missed, |flag| {
                equals(|t: &Ticket| t.is_missed, flag)
            })
    }
}
