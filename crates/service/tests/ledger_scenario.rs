use std::thread;

use proptest::prelude::*;

use bloodbank_core::{BloodGroup, DomainError};
use bloodbank_inventory::TransactionKind;
use bloodbank_requests::RequestStatus;
use bloodbank_service::dto::{
    CreateBloodRequestRequest, HistoryRequest, InitializeGroupRequest, StockMovementRequest,
};
use bloodbank_service::{BloodBank, BloodBankConfig, ErrorResponse};

fn empty_bank() -> BloodBank {
    BloodBank::new(BloodBankConfig::default()).unwrap()
}

fn movement(group: &str, quantity: i64) -> StockMovementRequest {
    StockMovementRequest {
        blood_group: group.to_string(),
        quantity,
        remarks: None,
    }
}

fn history_for(bank: &BloodBank, group: &str) -> Vec<bloodbank_inventory::Transaction> {
    bank.history(HistoryRequest {
        blood_group: Some(group.to_string()),
        ..HistoryRequest::default()
    })
    .unwrap()
}

#[test]
fn o_negative_walkthrough() {
    let bank = empty_bank();
    bank.initialize_group(InitializeGroupRequest {
        blood_group: "O-".to_string(),
        quantity: 5,
        min_threshold: Some(10),
    })
    .unwrap();

    let low: Vec<_> = bank.low_stock().unwrap().iter().map(|r| r.blood_group).collect();
    assert_eq!(low, vec![BloodGroup::ONeg]);
    assert!(history_for(&bank, "O-").is_empty());

    let update = bank.record_donation(movement("O-", 8)).unwrap();
    assert_eq!(update.record.quantity, 13);
    assert!(update.low_stock_alerts.is_empty());
    assert!(bank.low_stock().unwrap().is_empty());

    let history = history_for(&bank, "O-");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionKind::Donation);
    assert_eq!(history[0].quantity, 8);

    let err = bank.record_request(movement("O-", 20)).unwrap_err();
    assert_eq!(
        err,
        DomainError::InsufficientStock {
            blood_group: BloodGroup::ONeg,
            requested: 20,
            available: 13,
        }
    );
    assert_eq!(ErrorResponse::from(&err).error, "insufficient_stock");
    assert_eq!(bank.inventory_for("O-").unwrap().quantity, 13);
    assert_eq!(history_for(&bank, "O-").len(), 1);

    let update = bank.record_request(movement("O-", 13)).unwrap();
    assert_eq!(update.record.quantity, 0);
    assert_eq!(update.low_stock_alerts.len(), 1);
    assert_eq!(update.low_stock_alerts[0].current_quantity, 0);
    assert_eq!(
        update.low_stock_alerts[0].message,
        "LOW INVENTORY ALERT: O- is below minimum threshold. Current quantity: 0"
    );

    let history = history_for(&bank, "O-");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, TransactionKind::Request);
    assert_eq!(history[0].quantity, 13);
    assert_eq!(history[1].kind, TransactionKind::Donation);
}

#[test]
fn zero_and_unknown_group_movements_are_rejected() {
    let bank = empty_bank();
    bank.initialize_group(InitializeGroupRequest {
        blood_group: "A+".to_string(),
        quantity: 3,
        min_threshold: None,
    })
    .unwrap();

    assert!(matches!(
        bank.record_donation(movement("A+", 0)),
        Err(DomainError::InvalidArgument(_))
    ));
    assert!(matches!(
        bank.record_request(movement("A+", -1)),
        Err(DomainError::InvalidArgument(_))
    ));
    assert!(matches!(
        bank.record_donation(movement("B-", 1)),
        Err(DomainError::UnknownGroup(BloodGroup::BNeg))
    ));
    assert_eq!(bank.inventory_for("A+").unwrap().quantity, 3);
    assert!(bank.history(HistoryRequest::default()).unwrap().is_empty());
}

#[test]
fn stock_update_serializes_in_camel_case() {
    let bank = empty_bank();
    bank.ensure_all_groups().unwrap();
    let update = bank.record_donation(movement("AB+", 2)).unwrap();

    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json["record"]["bloodGroup"], "AB+");
    assert_eq!(json["record"]["quantity"], 2);
    assert_eq!(json["transaction"]["kind"], "DONATION");
    assert!(json["lowStockAlerts"].is_array());
}

#[test]
fn concurrent_fulfillment_never_oversells() {
    let bank = empty_bank();
    bank.initialize_group(InitializeGroupRequest {
        blood_group: "B+".to_string(),
        quantity: 10,
        min_threshold: Some(0),
    })
    .unwrap();

    let ids: Vec<String> = (0..8)
        .map(|_| {
            bank.create_request(CreateBloodRequestRequest {
                patient_name: "Lena Ortiz".to_string(),
                blood_group: "B+".to_string(),
                units_required: 3,
                hospital_name: "Harbor Hospital".to_string(),
                priority: "MEDIUM".to_string(),
                required_by: None,
                contact_number: "4155550123".to_string(),
                remarks: None,
            })
            .unwrap()
            .id_typed()
            .to_string()
        })
        .collect();

    let bank_ref = &bank;
    let fulfilled = thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|id| scope.spawn(move || bank_ref.fulfill_request(id).is_ok()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count()
    });

    assert_eq!(fulfilled, 3);
    assert_eq!(bank.inventory_for("B+").unwrap().quantity, 1);
    assert_eq!(bank.requests(Some("FULFILLED"), None).unwrap().len(), 3);
    assert_eq!(bank.requests(Some("PENDING"), None).unwrap().len(), 5);
    assert_eq!(
        bank.request_registry()
            .by_status(RequestStatus::Fulfilled)
            .unwrap()
            .len(),
        history_for(&bank, "B+").len()
    );
}

#[derive(Debug, Clone)]
enum Movement {
    Donate(i64),
    Request(i64),
}

fn movement_strategy() -> impl Strategy<Value = Movement> {
    prop_oneof![
        (1i64..20).prop_map(Movement::Donate),
        (1i64..25).prop_map(Movement::Request),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn history_replays_to_current_quantity(
        initial in 0i64..50,
        movements in prop::collection::vec(movement_strategy(), 0..30),
    ) {
        let bank = empty_bank();
        bank.initialize_group(InitializeGroupRequest {
            blood_group: "A-".to_string(),
            quantity: initial,
            min_threshold: Some(5),
        }).unwrap();

        for m in &movements {
            let _ = match *m {
                Movement::Donate(units) => bank.record_donation(movement("A-", units)),
                Movement::Request(units) => bank.record_request(movement("A-", units)),
            };
        }

        let history = bank.history(HistoryRequest {
            limit: Some(1000),
            ..HistoryRequest::default()
        }).unwrap();
        let replayed: i64 = initial
            + history
                .iter()
                .map(|tx| tx.kind.signed_delta(tx.quantity))
                .sum::<i64>();

        let record = bank.inventory_for("A-").unwrap();
        prop_assert_eq!(replayed, i64::from(record.quantity));
        prop_assert!(history.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }
}
