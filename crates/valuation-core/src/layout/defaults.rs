//! Built-in layout used before any version is published.

use crate::models::{AutoFillRule, FieldPart, InputMode, Layout, LayoutField, TextAlign};

/// Id of the built-in layout. Never stored.
pub const DEFAULT_LAYOUT_ID: &str = "default";

const LABEL_X: f64 = 15.0;
const VALUE_X: f64 = 70.0;
const LABEL_WIDTH: f64 = 50.0;
const VALUE_WIDTH: f64 = 120.0;
const ROW_HEIGHT: f64 = 7.0;

fn row(id: &str, field_id: &str, caption: &str, y: f64) -> LayoutField {
    LayoutField::text(
        id,
        field_id,
        FieldPart::at(LABEL_X, y, LABEL_WIDTH, ROW_HEIGHT)
            .with_text(caption)
            .bold(),
        FieldPart::at(VALUE_X, y, VALUE_WIDTH, ROW_HEIGHT),
    )
}

/// The A4 valuation form shipped with the application (version 0).
pub fn default_layout() -> Layout {
    let mut title = FieldPart::at(15.0, 12.0, 180.0, 10.0)
        .with_text("VEHICLE VALUATION REPORT")
        .bold();
    title.font_size = 16.0;
    title.align = TextAlign::Center;

    let grade = FieldPart::at(VALUE_X, 110.0, VALUE_WIDTH, ROW_HEIGHT)
        .with_choices(
            InputMode::FixedChoice,
            &["Excellent", "Very Good", "Good", "Average", "Poor"],
        )
        .with_weight("Excellent", 9.0)
        .with_weight("Very Good", 8.0)
        .with_weight("Good", 7.0)
        .with_weight("Average", 5.0)
        .with_weight("Poor", 3.0);

    let make = FieldPart::at(VALUE_X, 80.0, VALUE_WIDTH, ROW_HEIGHT).with_choices(
        InputMode::SuggestedChoice,
        &[
            "Maruti Suzuki",
            "Hyundai",
            "Tata",
            "Mahindra",
            "Honda",
            "Toyota",
            "Kia",
        ],
    );

    Layout {
        id: DEFAULT_LAYOUT_ID.to_string(),
        version: 0,
        fields: vec![
            LayoutField::static_text("title", "title", title).locked(),
            row("reportNumber", "reportNumber", "Report No.", 30.0),
            row("reportDate", "reportDate", "Date", 40.0),
            row("registrationNumber", "registrationNumber", "Registration No.", 50.0),
            row("engineNumber", "engineNumber", "Engine No.", 60.0),
            row("chassisNumber", "chassisNumber", "Chassis No.", 70.0),
            LayoutField::text(
                "make",
                "make",
                FieldPart::at(LABEL_X, 80.0, LABEL_WIDTH, ROW_HEIGHT)
                    .with_text("Make")
                    .bold(),
                make,
            ),
            row("model", "model", "Model", 90.0),
            row("yearOfManufacture", "yearOfManufacture", "Year of Manufacture", 100.0),
            LayoutField::text(
                "conditionGrade",
                "conditionGrade",
                FieldPart::at(LABEL_X, 110.0, LABEL_WIDTH, ROW_HEIGHT)
                    .with_text("Condition")
                    .bold(),
                grade,
            )
            .locked(),
            row("marketValueNum", "marketValueNum", "Market Value (Rs.)", 120.0),
            row("marketValueWords", "marketValueWords", "Market Value (in words)", 130.0)
                .with_auto_fill(AutoFillRule::NumberToWords {
                    source_field_id: "marketValueNum".to_string(),
                }),
            LayoutField::image(
                "vehiclePhoto",
                "vehiclePhoto",
                FieldPart::at(15.0, 145.0, 90.0, 65.0).with_text("Vehicle photo"),
            ),
        ],
        created_at: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::validate_fields;
    use crate::models::FieldKind;

    #[test]
    fn test_default_layout_is_valid() {
        let layout = default_layout();
        let repaired = validate_fields(&layout.fields).unwrap();
        assert_eq!(repaired, layout.fields);
    }

    #[test]
    fn test_default_layout_wiring() {
        let layout = default_layout();

        assert_eq!(layout.version, 0);
        assert!(layout.field("reportNumber").unwrap().is_effectively_locked());
        assert!(layout.is_auto_fill_source("marketValueNum"));
        assert_eq!(layout.grade_field("conditionGrade").unwrap().option_weight("Good"), Some(7.0));
        assert_eq!(layout.field("vehiclePhoto").unwrap().kind, FieldKind::Image);
    }
}
