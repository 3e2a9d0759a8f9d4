//! Duplicate-line consolidation.
//!
//! Raw selections are folded into an insertion-ordered map keyed by
//! [`CanonicalGroupKey`]. Per field the rules are:
//!
//! | field                                   | rule on a repeated key          |
//! |-----------------------------------------|---------------------------------|
//! | tier quantities, generic quantity, total| summed (absent = 0)             |
//! | tier prices, generic unit price         | first non-zero writer wins      |
//! | color and captured image fields         | backfilled only when absent     |
//! | variations, default images              | backfilled only when empty      |
//! | identity (code, id, title)              | kept from the first line        |
//!
//! After the fold every accumulator is priced once and lines whose total
//! quantity is not positive are dropped.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::key::{CanonicalGroupKey, build_key_with_color, line_color};
use crate::structs::consolidated_line::{ConsolidatedQuoteLine, ImageCandidates};
use crate::structs::raw_quote_line::{RawQuoteLine, TIER_COUNT, present};

/// Running state for one canonical key.
#[derive(Debug, Clone, PartialEq)]
pub struct LineAccumulator {
    pub key: CanonicalGroupKey,
    /// Display color resolved from the first contributing line.
    pub color: Option<String>,
    /// Merged view of every contributing line.
    pub merged: RawQuoteLine,
    /// Number of raw lines folded in.
    pub contributors: usize,
}

impl LineAccumulator {
    /// Seed the accumulator with a full copy of the first line of a key.
    pub fn seed(key: CanonicalGroupKey, color: Option<String>, line: &RawQuoteLine) -> Self {
        Self {
            key,
            color,
            merged: line.clone(),
            contributors: 1,
        }
    }

    /// Fold a subsequent line with the same key into the accumulator.
    pub fn absorb(&mut self, line: &RawQuoteLine) {
        let acc = &mut self.merged;

        add_into(&mut acc.tier_quantity_1, line.tier_quantity_1);
        add_into(&mut acc.tier_quantity_2, line.tier_quantity_2);
        add_into(&mut acc.tier_quantity_3, line.tier_quantity_3);
        add_into(&mut acc.quantity, line.quantity);
        add_into(&mut acc.line_total, line.line_total);

        backfill_price(&mut acc.tier_price_1, line.tier_price_1);
        backfill_price(&mut acc.tier_price_2, line.tier_price_2);
        backfill_price(&mut acc.tier_price_3, line.tier_price_3);
        backfill_price(&mut acc.unit_price, line.unit_price);

        backfill_text(&mut acc.selected_color_raw, &line.selected_color_raw);
        backfill_text(&mut acc.color_fallback, &line.color_fallback);
        backfill_text(&mut acc.captured_image_url, &line.captured_image_url);
        backfill_text(
            &mut acc.captured_variation_snapshot,
            &line.captured_variation_snapshot,
        );
        backfill_text(
            &mut acc.captured_variation_image,
            &line.captured_variation_image,
        );

        if acc.variations.is_empty() && !line.variations.is_empty() {
            acc.variations = line.variations.clone();
        }
        if !acc.default_images.iter().any(|i| present(i).is_some()) {
            acc.default_images = line.default_images.clone();
        }

        self.contributors += 1;
    }

    /// Price the merged line and turn it into an output line (image unresolved).
    pub fn consolidate(self) -> ConsolidatedQuoteLine {
        let m = self.merged;
        let tier_quantities = m.tier_quantities();
        let tier_prices = m.tier_prices();
        let pricing = price_line(
            tier_quantities,
            tier_prices,
            m.quantity.unwrap_or(0.0),
            m.unit_price,
        );

        if let Some(recorded) = m.line_total {
            if (recorded - pricing.line_total).abs() > 1e-6 {
                debug!(
                    key = %self.key,
                    recorded,
                    computed = pricing.line_total,
                    "stored line total differs from recomputed total"
                );
            }
        }

        ConsolidatedQuoteLine {
            key: self.key.into_string(),
            product_code: m.product_code,
            product_id: m.product_id,
            title: m.title,
            tier_quantities,
            tier_prices,
            quantity: pricing.quantity,
            unit_price: pricing.unit_price,
            line_total: pricing.line_total,
            resolved_color: self.color,
            resolved_image_url: None,
            image_source: None,
            images: ImageCandidates {
                captured_image_url: m.captured_image_url,
                captured_variation_snapshot: m.captured_variation_snapshot,
                captured_variation_image: m.captured_variation_image,
                variations: m.variations,
                default_images: m.default_images,
            },
        }
    }
}

/// Quantity and price of one consolidated line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePricing {
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Compute quantity, unit price and total from tier brackets and the
/// generic single-price fields.
///
/// - `quantity` is the sum of the three tiers and the generic quantity.
/// - When all three tiers are positive and at least one tier price is
///   positive, the unit price is the quantity-weighted average of the tier
///   prices over `quantity`.
/// - Otherwise the first non-zero of tier price 1..3 and the generic unit
///   price, or 0.
pub fn price_line(
    tier_quantities: [f64; TIER_COUNT],
    tier_prices: [Option<f64>; TIER_COUNT],
    generic_quantity: f64,
    unit_price_field: Option<f64>,
) -> LinePricing {
    let quantity = tier_quantities.iter().sum::<f64>() + generic_quantity;

    let all_tiers_filled = tier_quantities.iter().all(|q| *q > 0.0);
    let any_tier_priced = tier_prices.iter().any(|p| p.is_some_and(|p| p > 0.0));

    let unit_price = if all_tiers_filled && any_tier_priced && quantity > 0.0 {
        let weighted: f64 = tier_quantities
            .iter()
            .zip(tier_prices.iter())
            .map(|(q, p)| q * p.unwrap_or(0.0))
            .sum();
        weighted / quantity
    } else {
        tier_prices
            .iter()
            .copied()
            .chain(std::iter::once(unit_price_field))
            .flatten()
            .find(|p| *p != 0.0)
            .unwrap_or(0.0)
    };

    LinePricing {
        quantity,
        unit_price,
        line_total: quantity * unit_price,
    }
}

/// Fold raw lines into accumulators, preserving first-seen key order.
pub fn fold_lines(lines: &[RawQuoteLine]) -> IndexMap<CanonicalGroupKey, LineAccumulator> {
    let mut groups: IndexMap<CanonicalGroupKey, LineAccumulator> = IndexMap::new();

    for line in lines {
        let color = line_color(line);
        let key = build_key_with_color(line, color.as_deref());

        match groups.get_mut(&key) {
            Some(acc) => {
                trace!(key = %key, "merging duplicate quote line");
                acc.absorb(line);
            }
            None => {
                groups.insert(key.clone(), LineAccumulator::seed(key, color, line));
            }
        }
    }

    groups
}

/// Group raw lines by canonical key and consolidate each group.
///
/// Output order is the first-seen order of each key. Lines whose final
/// quantity is `<= 0` are omitted.
pub fn aggregate(lines: &[RawQuoteLine]) -> Vec<ConsolidatedQuoteLine> {
    let groups = fold_lines(lines);
    let group_count = groups.len();

    let out: Vec<ConsolidatedQuoteLine> = groups
        .into_values()
        .map(LineAccumulator::consolidate)
        .filter(|l| l.quantity > 0.0)
        .collect();

    debug!(
        raw = lines.len(),
        groups = group_count,
        kept = out.len(),
        "quote lines aggregated"
    );
    out
}

fn add_into(slot: &mut Option<f64>, v: Option<f64>) {
    *slot = Some(slot.unwrap_or(0.0) + v.unwrap_or(0.0));
}

fn backfill_price(slot: &mut Option<f64>, v: Option<f64>) {
    if slot.is_none_or(|p| p == 0.0) {
        if let Some(p) = v.filter(|p| *p != 0.0) {
            *slot = Some(p);
        }
    }
}

fn backfill_text(slot: &mut Option<String>, v: &Option<String>) {
    if present(slot).is_none() && present(v).is_some() {
        slot.clone_from(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::variation_record::VariationRecord;

    fn item(code: &str, color: &str) -> RawQuoteLine {
        RawQuoteLine {
            product_code: Some(code.into()),
            title: Some("Caneta Metal".into()),
            selected_color_raw: Some(color.into()),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_tier_one_lines_are_summed() {
        let mut a = item("P1", "Azul");
        a.tier_quantity_1 = Some(10.0);
        a.tier_price_1 = Some(5.0);
        let mut b = item("P1", r#"{"cor":"azul"}"#);
        b.tier_quantity_1 = Some(5.0);
        b.tier_price_1 = Some(5.0);

        let out = aggregate(&[a, b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].quantity, 15.0);
        assert_eq!(out[0].unit_price, 5.0);
        assert_eq!(out[0].line_total, 75.0);
        assert_eq!(out[0].tier_quantities, [15.0, 0.0, 0.0]);
    }

    #[test]
    fn three_filled_tiers_use_weighted_price() {
        let mut a = item("P1", "Azul");
        a.tier_quantity_1 = Some(10.0);
        a.tier_price_1 = Some(2.0);
        a.tier_quantity_2 = Some(5.0);
        a.tier_price_2 = Some(4.0);
        a.tier_quantity_3 = Some(5.0);
        a.tier_price_3 = Some(6.0);

        let out = aggregate(&[a]);
        assert_eq!(out[0].quantity, 20.0);
        assert_eq!(out[0].unit_price, 3.5);
        assert_eq!(out[0].line_total, 70.0);
    }

    #[test]
    fn generic_quantity_is_included_in_total_and_weighting() {
        let p = price_line([10.0, 10.0, 10.0], [Some(1.0), Some(2.0), Some(3.0)], 10.0, None);
        assert_eq!(p.quantity, 40.0);
        assert_eq!(p.unit_price, 60.0 / 40.0);
        assert_eq!(p.line_total, 60.0);
    }

    #[test]
    fn unit_price_falls_back_to_first_non_zero_price() {
        let p = price_line([0.0, 8.0, 0.0], [Some(0.0), Some(3.0), Some(9.0)], 0.0, Some(1.0));
        assert_eq!(p.unit_price, 3.0);

        let p = price_line([0.0; 3], [None, None, None], 4.0, Some(2.5));
        assert_eq!(p.quantity, 4.0);
        assert_eq!(p.unit_price, 2.5);
        assert_eq!(p.line_total, 10.0);

        let p = price_line([0.0; 3], [None, None, None], 4.0, None);
        assert_eq!(p.unit_price, 0.0);
        assert_eq!(p.line_total, 0.0);
    }

    #[test]
    fn filled_tiers_without_positive_price_use_fallback() {
        let p = price_line([1.0, 1.0, 1.0], [None, Some(0.0), None], 0.0, Some(7.0));
        assert_eq!(p.unit_price, 7.0);
    }

    #[test]
    fn first_price_writer_wins() {
        let mut a = item("P1", "Azul");
        a.tier_quantity_1 = Some(1.0);
        a.tier_price_2 = Some(0.0);
        let mut b = item("P1", "Azul");
        b.tier_quantity_1 = Some(1.0);
        b.tier_price_1 = Some(4.0);
        b.tier_price_2 = Some(6.0);
        let mut c = item("P1", "Azul");
        c.tier_quantity_1 = Some(1.0);
        c.tier_price_1 = Some(99.0);

        let groups = fold_lines(&[a, b, c]);
        let acc = groups.values().next().unwrap();
        assert_eq!(acc.contributors, 3);
        assert_eq!(acc.merged.tier_price_1, Some(4.0));
        assert_eq!(acc.merged.tier_price_2, Some(6.0));
        assert_eq!(acc.merged.tier_quantity_1, Some(3.0));
    }

    #[test]
    fn captured_images_are_backfilled_not_overwritten() {
        let mut a = item("P1", "Azul");
        a.quantity = Some(1.0);
        a.captured_variation_image = Some("first.png".into());
        let mut b = item("P1", "Azul");
        b.quantity = Some(1.0);
        b.captured_image_url = Some("captured.png".into());
        b.captured_variation_image = Some("second.png".into());
        b.variations = vec![VariationRecord {
            color: Some("Azul".into()),
            image: Some("v.png".into()),
            ..Default::default()
        }];

        let out = aggregate(&[a, b]);
        let imgs = &out[0].images;
        assert_eq!(imgs.captured_image_url.as_deref(), Some("captured.png"));
        assert_eq!(imgs.captured_variation_image.as_deref(), Some("first.png"));
        assert_eq!(imgs.variations.len(), 1);
    }

    #[test]
    fn zero_quantity_groups_are_dropped() {
        let mut a = item("P1", "Azul");
        a.tier_price_1 = Some(3.0);
        let mut b = item("P2", "Azul");
        b.quantity = Some(2.0);
        let mut c = item("P3", "Azul");
        c.quantity = Some(3.0);
        let mut d = item("P3", "Azul");
        d.quantity = Some(-3.0);

        let out = aggregate(&[a, b, c, d]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].product_code.as_deref(), Some("P2"));
    }

    #[test]
    fn output_keeps_first_seen_order_and_partitions_input() {
        let mut lines = Vec::new();
        let picks = [
            ("B", "Azul"),
            ("A", "Verde"),
            ("B", "AZUL"),
            ("C", "Preto"),
            ("A", "vérde"),
        ];
        for (code, color) in picks {
            let mut l = item(code, color);
            l.tier_quantity_1 = Some(1.0);
            lines.push(l);
        }

        let groups = fold_lines(&lines);
        let contributors: usize = groups.values().map(|a| a.contributors).sum();
        assert_eq!(contributors, lines.len());

        let out = aggregate(&lines);
        let codes: Vec<_> = out.iter().map(|l| l.product_code.clone().unwrap()).collect();
        assert_eq!(codes, ["B", "A", "C"]);
        assert_eq!(out[0].quantity, 2.0);
        assert_eq!(out[1].quantity, 2.0);
        assert_eq!(out[2].quantity, 1.0);
    }

    #[test]
    fn identity_comes_from_first_contributor() {
        let mut a = item("P1", "Azul");
        a.quantity = Some(1.0);
        a.product_id = Some("first".into());
        let mut b = item("p1", "azul");
        b.quantity = Some(1.0);
        b.product_id = Some("second".into());
        b.title = Some("CANETA METAL".into());

        let out = aggregate(&[a, b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].product_code.as_deref(), Some("P1"));
        assert_eq!(out[0].product_id.as_deref(), Some("first"));
        assert_eq!(out[0].title.as_deref(), Some("Caneta Metal"));
        assert_eq!(out[0].resolved_color.as_deref(), Some("Azul"));
    }
}
