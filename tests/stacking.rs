//! Integration tests for stacking order and the evolving cart state.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::GBP};
use testresult::TestResult;

use rebate::prelude::*;

fn gbp(minor: i64) -> Money<'static, rusty_money::iso::Currency> {
    Money::from_minor(minor, GBP)
}

fn line(id: &str, qty: u32, price: i64, tags: &[&str]) -> LineItem<'static> {
    LineItem::new(
        id,
        qty,
        ProductSnapshot::new(format!("prod_{id}"), id, gbp(price)).with_tags(TagSet::from_strs(tags)),
    )
}

fn regular(handle: &str, percent: i64, fixed: i64) -> Discount<'static> {
    Discount::new(
        handle,
        DiscountDetails::Regular(RegularExtra {
            percent: Decimal::from(percent),
            fixed: gbp(fixed),
        }),
    )
    .with_filter(Filter::All)
}

fn order(handle: &str, percent: i64, fixed: i64) -> Discount<'static> {
    Discount::new(
        handle,
        DiscountDetails::Order(OrderExtra {
            percent: Decimal::from(percent),
            fixed: gbp(fixed),
        }),
    )
}

fn handles<'d>(data: &'d PricingData<'_>) -> Vec<&'d str> {
    data.applied()
        .iter()
        .filter_map(|entry| entry.discount.as_deref())
        .collect()
}

fn amounts(data: &PricingData<'_>) -> Vec<i64> {
    data.applied()
        .iter()
        .map(|entry| entry.total_discount.to_minor_units())
        .collect()
}

#[test]
fn automatic_discounts_run_before_manual_regardless_of_priority() -> TestResult {
    let lines = [line("a", 10, 100, &[])];
    let auto = [regular("auto", 10, 0).with_priority(10)];
    let manual = [order("COUPON", 0, 100)
        .with_priority(-5)
        .with_application(DiscountApplication::Manual)];

    let data = calculate_pricing(&lines, &auto, &manual, None, None)?;

    assert_eq!(handles(&data), vec!["auto", "COUPON"]);

    let coupon = data.applied().get(1).ok_or("expected the coupon step")?;

    assert_eq!(coupon.discount_code.as_deref(), Some("COUPON"));
    assert_eq!(
        data.applied().first().and_then(|entry| entry.discount_code.clone()),
        None
    );

    Ok(())
}

#[test]
fn lower_priority_runs_first_and_claims_the_units() -> TestResult {
    let lines = [line("a", 4, 100, &[])];
    let auto = [
        regular("second", 50, 0).with_priority(2),
        regular("first", 10, 0).with_priority(1),
    ];

    let data = calculate_pricing(&lines, &auto, &[], None, None)?;

    // `second` finds no undiscounted units left and is out of scope
    assert_eq!(handles(&data), vec!["first"]);
    assert_eq!(data.subtotal_discount(), gbp(40));

    Ok(())
}

#[test]
fn equal_priorities_keep_input_order() -> TestResult {
    let lines = [line("a", 10, 100, &[])];
    let auto = [order("pound-off", 0, 100), order("ten-percent", 10, 0)];

    let data = calculate_pricing(&lines, &auto, &[], None, None)?;

    assert_eq!(handles(&data), vec!["pound-off", "ten-percent"]);
    assert_eq!(amounts(&data), vec![100, 90]);

    Ok(())
}

#[test]
fn consumed_units_are_not_discounted_again() -> TestResult {
    let lines = [line("legs", 3, 100, &["legs"]), line("arms", 2, 100, &["arms"])];
    let auto = [
        regular("legs-ten", 10, 0).with_filter(Filter::InTags(TagSet::from_strs(&["legs"]))),
        regular("half-price", 50, 0),
    ];

    let data = calculate_pricing(&lines, &auto, &[], None, None)?;

    assert_eq!(amounts(&data), vec![30, 100]);

    let quantities: Vec<u64> = data
        .applied()
        .iter()
        .map(|entry| entry.quantity_discounted)
        .collect();

    assert_eq!(quantities, vec![3, 2]);
    assert_eq!(data.quantity_discounted(), 5);
    assert_eq!(
        data.applied().last().map(|entry| entry.quantity_undiscounted),
        Some(0)
    );

    Ok(())
}

#[test]
fn order_discounts_see_the_running_subtotal() -> TestResult {
    let lines = [line("a", 10, 100, &[])];
    let auto = [
        regular("half-price", 50, 0),
        order("big-spender", 10, 0).with_filter(Filter::SubtotalInRange(ValueRange::at_least(600))),
        order("everyone", 10, 0),
    ];

    let data = calculate_pricing(&lines, &auto, &[], None, None)?;

    assert_eq!(handles(&data), vec!["half-price", "everyone"]);
    assert_eq!(amounts(&data), vec![500, 50]);
    assert_eq!(data.subtotal(), gbp(450));

    Ok(())
}

#[test]
fn evo_entries_record_consumed_units_per_line() -> TestResult {
    let lines = [line("legs", 3, 100, &["legs"]), line("arms", 2, 100, &[])];
    let auto = [regular("legs", 10, 0).with_filter(Filter::InTags(TagSet::from_strs(&["legs"])))];

    let data = calculate_pricing(&lines, &auto, &[], None, None)?;
    let step = data.applied().first().ok_or("expected one step")?;

    assert_eq!(
        step.line_items,
        Some(vec![EvoLine {
            line_item_id: "legs".to_string(),
            quantity: 3,
        }])
    );

    let engine = PricingEngine::new(EngineConfig {
        record_line_items: false,
        ..EngineConfig::default()
    });
    let data = engine.price(&PricingRequest::new(&lines).with_auto_discounts(&auto))?;

    assert_eq!(data.applied().first().map(|entry| entry.line_items.clone()), Some(None));

    Ok(())
}

#[test]
fn unit_selection_changes_which_units_a_bundle_takes() -> TestResult {
    let lines = [
        line("gold-arm", 1, 300, &["arms"]),
        line("tin-arm", 1, 100, &["arms"]),
        line("leg", 1, 100, &["legs"]),
    ];
    let auto = [Discount::new(
        "arm-and-leg",
        DiscountDetails::Bundle(BundleExtra {
            percent: Decimal::from(50),
            fixed: gbp(0),
            recursive: false,
        }),
    )
    .with_filters([
        Filter::InTags(TagSet::from_strs(&["arms"])),
        Filter::InTags(TagSet::from_strs(&["legs"])),
    ])];

    let price_with = |unit_selection| -> Result<i64, PricingError> {
        let engine = PricingEngine::new(EngineConfig {
            unit_selection,
            ..EngineConfig::default()
        });
        let data = engine.price(&PricingRequest::new(&lines).with_auto_discounts(&auto))?;

        Ok(data.subtotal_discount().to_minor_units())
    };

    assert_eq!(price_with(UnitSelection::ListOrder)?, 200);
    assert_eq!(price_with(UnitSelection::CheapestFirst)?, 100);
    assert_eq!(price_with(UnitSelection::MostExpensiveFirst)?, 200);

    Ok(())
}

#[test]
fn regular_fixed_amount_scope_is_configurable() -> TestResult {
    let lines = [line("a", 3, 100, &[]), line("b", 2, 100, &[])];
    let auto = [regular("ten-pence", 0, 10)];

    let price_with = |regular_fixed| -> Result<i64, PricingError> {
        let engine = PricingEngine::new(EngineConfig {
            regular_fixed,
            ..EngineConfig::default()
        });
        let data = engine.price(&PricingRequest::new(&lines).with_auto_discounts(&auto))?;

        Ok(data.subtotal_discount().to_minor_units())
    };

    assert_eq!(price_with(FixedAmountScope::PerOrder)?, 10);
    assert_eq!(price_with(FixedAmountScope::PerLineItem)?, 20);
    assert_eq!(price_with(FixedAmountScope::PerUnit)?, 50);

    Ok(())
}

#[test]
fn order_filters_read_customer_and_timestamp() -> TestResult {
    let lines = [line("a", 10, 100, &[])];
    let spring: Timestamp = "2026-03-01T12:00:00Z".parse()?;
    let auto = [
        order("loyal", 0, 100).with_filter(Filter::HasCustomer(TagSet::from_strs(&["cus_ada"]))),
        order("spring-sale", 10, 0).with_filter(Filter::DateInRange(ValueRange::between(
            "2026-03-01T00:00:00Z".parse()?,
            "2026-05-31T23:59:59Z".parse()?,
        ))),
    ];

    let anonymous =
        PricingEngine::default().price(&PricingRequest::new(&lines).with_auto_discounts(&auto))?;

    assert!(anonymous.applied().is_empty());

    let request = PricingRequest::new(&lines)
        .with_auto_discounts(&auto)
        .with_customer_id(Some("cus_ada"))
        .with_placed_at(Some(spring));
    let known = PricingEngine::default().price(&request)?;

    assert_eq!(handles(&known), vec!["loyal", "spring-sale"]);
    assert_eq!(amounts(&known), vec![100, 90]);

    Ok(())
}

#[test]
fn search_terms_list_effective_discounts_once() -> TestResult {
    let lines = [line("a", 10, 100, &[])];
    let auto = [
        order("ten-percent", 10, 0),
        order("nothing", 0, 0),
        order("ten-percent", 10, 0),
    ];

    let data = calculate_pricing(&lines, &auto, &[], None, None)?;

    assert_eq!(data.search_terms(), vec!["discount:ten-percent".to_string()]);

    Ok(())
}

#[test]
fn order_gate_sees_products_consumed_by_earlier_steps() -> TestResult {
    let lines = [line("robot-arm", 2, 100, &[])];
    let arms_in_order = order("arm-owner", 0, 50)
        .with_filter(Filter::InHandles(TagSet::from_strs(&["robot-arm"])));

    let alone = calculate_pricing(&lines, std::slice::from_ref(&arms_in_order), &[], None, None)?;

    assert_eq!(amounts(&alone), vec![50]);

    let auto = [regular("ten-percent", 10, 0), arms_in_order];
    let stacked = calculate_pricing(&lines, &auto, &[], None, None)?;

    assert_eq!(handles(&stacked), vec!["ten-percent", "arm-owner"]);
    assert_eq!(amounts(&stacked), vec![20, 50]);
    assert_eq!(stacked.subtotal_discount(), gbp(70));

    Ok(())
}
