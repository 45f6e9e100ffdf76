use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Price scale: micros (1e-6 currency units).
pub const MICROS_SCALE: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// Booking / return identity
// ---------------------------------------------------------------------------

/// Which booking table a return closes out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    ProductOrder,
    PackageBooking,
}

impl BookingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingSource::ProductOrder => "product_order",
            BookingSource::PackageBooking => "package_booking",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "product_order" => Ok(BookingSource::ProductOrder),
            "package_booking" => Ok(BookingSource::PackageBooking),
            other => Err(anyhow!("invalid booking source: {}", other)),
        }
    }

    /// Backing table for the booking row. Only these two literals ever reach SQL.
    pub fn table_name(&self) -> &'static str {
        match self {
            BookingSource::ProductOrder => "product_orders",
            BookingSource::PackageBooking => "package_bookings",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    Completed,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "pending",
            ReturnStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ReturnStatus::Pending),
            "completed" => Ok(ReturnStatus::Completed),
            other => Err(anyhow!("invalid return status: {}", other)),
        }
    }

    /// `completed` accepts no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReturnStatus::Completed)
    }
}

/// Header of a return as stored upstream. Line items are not part of it:
/// they are written exactly once, by processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReturnRecord {
    pub id: Uuid,
    pub return_number: String,
    pub booking_id: Uuid,
    pub booking_source: BookingSource,
    pub delivery_id: Option<Uuid>,
    pub franchise_id: Uuid,
    pub status: ReturnStatus,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    SuperAdmin,
    FranchiseAdmin,
    Staff,
    Readonly,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::SuperAdmin => "super_admin",
            ActorRole::FranchiseAdmin => "franchise_admin",
            ActorRole::Staff => "staff",
            ActorRole::Readonly => "readonly",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "super_admin" => Ok(ActorRole::SuperAdmin),
            "franchise_admin" => Ok(ActorRole::FranchiseAdmin),
            "staff" => Ok(ActorRole::Staff),
            "readonly" => Ok(ActorRole::Readonly),
            other => Err(anyhow!("invalid actor role: {}", other)),
        }
    }
}

/// Authenticated caller, as handed over by the auth layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: ActorRole,
    /// `None` only for super admins that are not pinned to a franchise.
    pub franchise_id: Option<Uuid>,
}

impl Actor {
    pub fn new(user_id: Uuid, role: ActorRole, franchise_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            role,
            franchise_id,
        }
    }

    /// Super admins see every franchise; everyone else only their own.
    pub fn can_access_franchise(&self, franchise_id: Uuid) -> bool {
        if self.role == ActorRole::SuperAdmin {
            return true;
        }
        self.franchise_id == Some(franchise_id)
    }

    pub fn can_process_returns(&self) -> bool {
        !matches!(self.role, ActorRole::Readonly)
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Stock pools of one product.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInventory {
    pub stock_total: i64,
    pub stock_available: i64,
    pub stock_booked: i64,
    pub stock_damaged: i64,
    pub stock_in_laundry: i64,
}

/// Point-in-time product row: identity, pricing (micros) and pools.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub product_code: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub rental_price_micros: Option<i64>,
    pub sale_price_micros: Option<i64>,
    pub price_micros: Option<i64>,
    pub inventory: ProductInventory,
}

impl ProductSnapshot {
    /// Sale price used for archive snapshots; falls back to the list price.
    pub fn original_sale_price_micros(&self) -> Option<i64> {
        self.sale_price_micros.or(self.price_micros)
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// One submitted line: how the delivered quantity of a product came back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLineInput {
    pub product_id: Uuid,
    pub qty_delivered: i64,
    /// Used units (need cleaning unless routed straight back to available).
    pub qty_returned: i64,
    /// Subset of `qty_returned` going to laundry. Absent => derived from the
    /// submission-level `send_to_laundry` flag.
    #[serde(default)]
    pub qty_to_laundry: Option<i64>,
    pub qty_not_used: i64,
    pub qty_damaged: i64,
    pub qty_lost: i64,
    #[serde(default)]
    pub damage_reason: Option<String>,
    #[serde(default)]
    pub damage_description: Option<String>,
    #[serde(default)]
    pub damage_severity: Option<String>,
    #[serde(default)]
    pub lost_reason: Option<String>,
    #[serde(default)]
    pub lost_description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ReturnLineInput {
    /// Zero-outcome line for `product_id`; tests and tooling fill in the rest.
    pub fn new(product_id: Uuid, qty_delivered: i64) -> Self {
        Self {
            product_id,
            qty_delivered,
            qty_returned: 0,
            qty_to_laundry: None,
            qty_not_used: 0,
            qty_damaged: 0,
            qty_lost: 0,
            damage_reason: None,
            damage_description: None,
            damage_severity: None,
            lost_reason: None,
            lost_description: None,
            notes: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnSubmission {
    #[serde(default)]
    pub items: Vec<ReturnLineInput>,
    #[serde(default)]
    pub send_to_laundry: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub processing_notes: Option<String>,
}

/// `Some(s)` with `s` non-blank.
pub(crate) fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
