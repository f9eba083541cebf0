use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use storefront_api::{
    models::{EstadoFactura, FacturaDoc, FacturaDocItem},
    report::{
        BOM, DOCUMENT_REPORT_HEADER, INVOICE_REPORT_HEADER, InvoiceReportRow, document_detail,
        escape_field, render_document_report, render_invoice_report, report_filename,
    },
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn read_records(csv_text: &str) -> Vec<Vec<String>> {
    let body = csv_text.strip_prefix(BOM).expect("report starts with a BOM");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(body.as_bytes());
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn plain_fields_are_left_alone() {
    assert_eq!(escape_field("Mate"), "Mate");
    assert_eq!(escape_field(""), "");
}

#[test]
fn special_characters_force_quoting() {
    assert_eq!(escape_field("a,b"), "\"a,b\"");
    assert_eq!(escape_field("a|b"), "\"a|b\"");
    assert_eq!(escape_field("dijo \"hola\""), "\"dijo \"\"hola\"\"\"");
    assert_eq!(escape_field("linea\nnueva"), "\"linea\nnueva\"");
}

#[test]
fn invoice_report_round_trips_through_a_csv_reader() {
    let rows = vec![
        InvoiceReportRow {
            fecha: "2024-05-10 15:30".into(),
            cliente: "Pérez, \"Ana\"".into(),
            productos: Some("Mate x 2 | Yerba x 1".into()),
            total: dec("3500"),
        },
        InvoiceReportRow {
            fecha: "2024-05-09 09:00".into(),
            cliente: "Invitado".into(),
            productos: None,
            total: dec("10.5"),
        },
    ];

    let out = render_invoice_report(&rows);
    let records = read_records(&out);

    assert_eq!(records[0], INVOICE_REPORT_HEADER);
    assert_eq!(
        records[1],
        ["2024-05-10 15:30", "Pérez, \"Ana\"", "Mate x 2 | Yerba x 1", "3500.00"]
    );
    assert_eq!(records[2], ["2024-05-09 09:00", "Invitado", "", "10.50"]);
}

fn doc() -> FacturaDoc {
    FacturaDoc {
        id: "1715355000000-abc123".into(),
        ts: 1_715_355_000_000,
        fecha_iso: "2024-05-10T15:30:00.000Z".into(),
        total_ars: dec("2100"),
        total_usd: Some(dec("2.1")),
        tipo_cambio: Some(dec("1000")),
        estado: EstadoFactura::Pagada,
        user_id: None,
        cliente_email: Some("ana@example.com".into()),
        cliente_nombre: Some("Ana, la del \"kiosco\"".into()),
        items: vec![
            FacturaDocItem {
                producto_id: 1,
                producto_nombre: Some("Mate".into()),
                cantidad: 2,
                precio_unitario: dec("1000"),
                subtotal_ars: Some(dec("2000")),
                precio_unit_usd: Some(dec("1")),
                subtotal_usd: Some(dec("2")),
            },
            FacturaDocItem {
                producto_id: 2,
                producto_nombre: None,
                cantidad: 1,
                precio_unitario: dec("100"),
                subtotal_ars: None,
                precio_unit_usd: None,
                subtotal_usd: None,
            },
        ],
    }
}

#[test]
fn document_detail_joins_items_with_pipes() {
    assert_eq!(
        document_detail(&doc()),
        "Mate x2 @1000.00 = 2000.00 | (sin nombre) x1 @100.00 = 100.00"
    );
}

#[test]
fn document_report_round_trips_through_a_csv_reader() {
    let mut unrated = doc();
    unrated.id = "1715355000001-zzzzzz".into();
    unrated.total_usd = None;
    unrated.tipo_cambio = None;
    unrated.estado = EstadoFactura::Anulada;
    unrated.cliente_email = None;

    let out = render_document_report(&[doc(), unrated]);
    let records = read_records(&out);

    assert_eq!(records[0], DOCUMENT_REPORT_HEADER);
    assert_eq!(records[1][0], "1715355000000-abc123");
    assert_eq!(records[1][1], "2024-05-10 15:30");
    assert_eq!(records[1][2], "2100.00");
    assert_eq!(records[1][3], "2.10");
    assert_eq!(records[1][4], "1000");
    assert_eq!(records[1][5], "PAGADA");
    assert_eq!(records[1][7], "Ana, la del \"kiosco\"");
    assert_eq!(records[1][8], document_detail(&doc()));

    assert_eq!(records[2][3], "");
    assert_eq!(records[2][4], "");
    assert_eq!(records[2][5], "ANULADA");
    assert_eq!(records[2][6], "");
}

#[test]
fn filename_carries_the_day() {
    let day = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
    assert_eq!(report_filename(day), "facturas-2024-03-07.csv");
}
