use benchboard::data::parse_table;
use benchboard::format::{Background, CellStyle};
use benchboard::html::render_table;
use benchboard::view::{render, LayoutMode, View};
use std::sync::Arc;

#[test]
fn two_row_table_renders_average() {
    let table = parse_table("Test,score\nA,0.2\nB,0.8\n".as_bytes())
        .unwrap()
        .with_average();
    let vm = render(&table, LayoutMode::Normal);

    assert_eq!(vm.rows.len(), 3);
    let labels: Vec<&str> = vm.rows.iter().map(|r| r[0].text.as_str()).collect();
    assert_eq!(labels, ["A", "B", "Average"]);
    assert_eq!(vm.rows[2][1].text, "50.00");
    assert_eq!(
        vm.rows[2][1].style,
        CellStyle::background(Background::Rgb(127, 127, 0))
    );
    assert_eq!(vm.rows[0][0].style, CellStyle::emphasized());
    assert_eq!(vm.rows[0][1].text, "20.00");
}

#[test]
fn colour_uses_ratio_not_percentage() {
    let table = parse_table("Test,score\nA,0.9\n".as_bytes()).unwrap();
    let vm = render(&table, LayoutMode::Normal);
    let cell = &vm.rows[0][1];
    assert_eq!(cell.text, "90.00");
    assert_eq!(cell.style.background_color, Some(Background::Rgb(25, 229, 0)));
}

#[test]
fn toggle_round_trip_matches_initial_render() {
    let table = parse_table("Test,m1,m2\nA,0.2,0.4\nB,0.8,\n".as_bytes())
        .unwrap()
        .with_average();
    let mut view = View::new(Arc::new(table), "Scores");

    let initial = view.current();
    let transposed = view.select(LayoutMode::Transposed);
    assert_eq!(transposed.label_column, "Model");
    assert_eq!(transposed.columns, ["A", "B", "Average"]);
    let restored = view.select(LayoutMode::Normal);

    assert_eq!(restored, initial);
    assert_eq!(render_table(&restored), render_table(&initial));
}

#[test]
fn view_model_json_shape() {
    let table = parse_table("Test,m1\nA,1\n".as_bytes()).unwrap();
    let vm = render(&table, LayoutMode::Transposed);
    let value = serde_json::to_value(&vm).unwrap();
    assert_eq!(value["layout"], "transpose");
    assert_eq!(value["label_column"], "Model");
    assert_eq!(value["rows"][0][0]["text"], "m1");
    assert_eq!(value["rows"][0][0]["style"]["fontWeight"], "bold");
    assert_eq!(value["rows"][0][1]["style"]["backgroundColor"], "rgb(0, 255, 0)");
}
