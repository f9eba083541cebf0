use chrono::{TimeZone, Utc};
use storefront_api::report::{
    PeriodSales, Periodo, ProductUnits, SoldInvoice, SoldLine, UNNAMED_PRODUCT, sales_by_period,
    top_products,
};

fn sold(y: i32, m: u32, d: u32, lines: &[(Option<&str>, i32)]) -> SoldInvoice {
    SoldInvoice {
        fecha: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        lines: lines
            .iter()
            .map(|(nombre, cantidad)| SoldLine {
                producto_nombre: nombre.map(str::to_string),
                cantidad: *cantidad,
            })
            .collect(),
    }
}

fn sample() -> Vec<SoldInvoice> {
    vec![
        // Wednesday
        sold(2024, 5, 8, &[(Some("Mate"), 2), (Some("Yerba"), 1)]),
        // Saturday, same week
        sold(2024, 5, 11, &[(Some("Mate"), 1)]),
        // Sunday, starts the next week
        sold(2024, 5, 12, &[(Some("Termo"), 3), (None, 1), (Some("  "), 2)]),
        sold(2024, 6, 1, &[(Some("Yerba"), 4), (Some("Bombilla"), 0)]),
    ]
}

fn period(periodo: &str, ventas: usize) -> PeriodSales {
    PeriodSales {
        periodo: periodo.to_string(),
        ventas,
    }
}

#[test]
fn sales_grouped_by_day() {
    assert_eq!(
        sales_by_period(&sample(), Periodo::Dia),
        vec![
            period("2024-05-08", 1),
            period("2024-05-11", 1),
            period("2024-05-12", 1),
            period("2024-06-01", 1),
        ]
    );
}

#[test]
fn weeks_start_on_sunday() {
    assert_eq!(
        sales_by_period(&sample(), Periodo::Semana),
        vec![
            period("2024-05-05", 2),
            period("2024-05-12", 1),
            period("2024-05-26", 1),
        ]
    );
}

#[test]
fn sales_grouped_by_month() {
    assert_eq!(
        sales_by_period(&sample(), Periodo::Mes),
        vec![period("2024-05", 3), period("2024-06", 1)]
    );
}

#[test]
fn periodo_parses_from_lowercase() {
    let p: Periodo = serde_json::from_str("\"semana\"").unwrap();
    assert_eq!(p, Periodo::Semana);
    assert_eq!(Periodo::default(), Periodo::Dia);
}

#[test]
fn top_products_rank_by_units_then_name() {
    let ranked = top_products(&sample(), 6);
    assert_eq!(
        ranked,
        vec![
            ProductUnits { producto: "Yerba".into(), unidades: 5 },
            ProductUnits { producto: "Mate".into(), unidades: 3 },
            ProductUnits { producto: UNNAMED_PRODUCT.into(), unidades: 3 },
            ProductUnits { producto: "Termo".into(), unidades: 3 },
        ]
    );
}

#[test]
fn top_products_respects_the_limit() {
    let ranked = top_products(&sample(), 2);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].producto, "Yerba");
    assert!(top_products(&[], 6).is_empty());
}
