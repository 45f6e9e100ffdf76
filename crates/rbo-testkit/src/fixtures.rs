use rbo_returns::{
    Actor, ActorRole, BookingSource, ProductInventory, ProductSnapshot, ReturnRecord,
    ReturnStatus, MICROS_SCALE,
};
use uuid::Uuid;

use crate::MemoryStore;

pub fn product(name: &str, inventory: ProductInventory) -> ProductSnapshot {
    ProductSnapshot {
        id: Uuid::new_v4(),
        name: name.to_string(),
        product_code: Some(format!("P-{}", name.to_uppercase())),
        barcode: None,
        category: Some("linen".to_string()),
        image_url: None,
        rental_price_micros: Some(8 * MICROS_SCALE),
        sale_price_micros: Some(40 * MICROS_SCALE),
        price_micros: None,
        inventory,
    }
}

pub fn pending_return(
    franchise_id: Uuid,
    booking_id: Uuid,
    delivery_id: Option<Uuid>,
) -> ReturnRecord {
    ReturnRecord {
        id: Uuid::new_v4(),
        return_number: format!("RET-{}", &Uuid::new_v4().simple().to_string()[..8]),
        booking_id,
        booking_source: BookingSource::ProductOrder,
        delivery_id,
        franchise_id,
        status: ReturnStatus::Pending,
        notes: None,
    }
}

pub fn staff(franchise_id: Uuid) -> Actor {
    Actor::new(Uuid::new_v4(), ActorRole::Staff, Some(franchise_id))
}

/// One franchise, one product, one delivered booking, one pending return.
#[derive(Clone, Debug)]
pub struct BasicFixture {
    pub franchise_id: Uuid,
    pub actor: Actor,
    pub record: ReturnRecord,
    pub product: ProductSnapshot,
}

/// Product pools: total 40, available 30, booked 10.
pub async fn seed_basic(store: &MemoryStore, delivery_id: Option<Uuid>) -> BasicFixture {
    let franchise_id = Uuid::new_v4();
    let product = product(
        "tablecloth",
        ProductInventory {
            stock_total: 40,
            stock_available: 30,
            stock_booked: 10,
            stock_damaged: 0,
            stock_in_laundry: 0,
        },
    );
    let booking_id = Uuid::new_v4();
    let record = pending_return(franchise_id, booking_id, delivery_id);

    store.insert_product(product.clone()).await;
    store
        .insert_booking(BookingSource::ProductOrder, booking_id, "delivered")
        .await;
    store.insert_return(record.clone()).await;

    BasicFixture {
        franchise_id,
        actor: staff(franchise_id),
        record,
        product,
    }
}
