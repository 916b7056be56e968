use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use termsheet_cli::script::ReplayReport;
use termsheet_engine::{FormController, PopulateReport, Severity, ValidationSummary};
use termsheet_model::{FieldKey, FieldSchema, FormSchema, SchemaIssue};

pub fn print_schema(schema: &FormSchema) {
    println!("Form: {}", schema.title);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Section"),
        header_cell("Field"),
        header_cell("Label"),
        header_cell("Type"),
        header_cell("Required"),
        header_cell("Rule"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Center);
    for section in &schema.sections {
        for field in &section.fields {
            table.add_row(vec![
                dim_cell(&section.title),
                key_cell(field),
                Cell::new(&field.label),
                Cell::new(field.field_type),
                required_cell(field.required),
                rule_cell(schema, field),
            ]);
        }
    }
    println!("{table}");
}

pub fn print_lint(issues: &[SchemaIssue]) {
    if issues.is_empty() {
        println!("No schema issues.");
        return;
    }
    println!();
    println!("Schema issues:");
    for issue in issues {
        println!("- {issue}");
    }
}

pub fn print_check(
    form: &FormController,
    report: &PopulateReport,
    summary: &ValidationSummary,
    completion: f64,
) {
    println!(
        "Loaded {} values, {:.1}% complete",
        report.applied, completion
    );
    if !report.unknown.is_empty() {
        println!("Ignored undeclared fields: {}", report.unknown.join(", "));
    }
    print_issue_table(form.schema(), summary);
    println!("{summary}");
}

pub fn print_replay(schema: &FormSchema, report: &ReplayReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Value"),
        header_cell("Visible"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for (key, value) in report.values.iter() {
        let visible = report.visible.contains(key);
        let label = field_label(schema, key);
        let value_cell = if value.is_blank() {
            dim_cell("-")
        } else {
            Cell::new(value)
        };
        table.add_row(vec![
            Cell::new(label),
            value_cell,
            if visible {
                Cell::new("✓").fg(Color::Green)
            } else {
                dim_cell("-")
            },
        ]);
    }
    println!("{table}");
    print_issue_table(schema, &report.validation);
    println!(
        "{:.1}% complete, {}, {} draft saves",
        report.state.completion_rate,
        if report.state.is_valid {
            "valid"
        } else {
            "invalid"
        },
        report.drafts_saved
    );
}

fn print_issue_table(schema: &FormSchema, summary: &ValidationSummary) {
    let issues: Vec<_> = summary.issues().collect();
    if issues.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Severity"),
        header_cell("Message"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for issue in issues {
        table.add_row(vec![
            Cell::new(field_label(schema, issue.field())),
            severity_cell(issue.severity()),
            Cell::new(issue.message()),
        ]);
    }
    println!("{table}");
}

fn field_label<'a>(schema: &'a FormSchema, key: &'a FieldKey) -> &'a str {
    schema
        .field(key.as_str())
        .map_or(key.as_str(), |field| field.label.as_str())
}

fn rule_cell(schema: &FormSchema, field: &FieldSchema) -> Cell {
    if let Some(rule) = field.formula {
        return Cell::new(format!("= {rule}")).fg(Color::Blue);
    }
    match schema.conditionals.iter().find(|c| c.target == field.key) {
        Some(rule) => {
            let condition_field = rule
                .condition_field
                .as_ref()
                .map_or("(edited field)", FieldKey::as_str);
            Cell::new(format!(
                "if {condition_field} {}",
                rule.operator.name()
            ))
            .fg(Color::Yellow)
        }
        None => dim_cell("-"),
    }
}

fn key_cell(field: &FieldSchema) -> Cell {
    if field.is_readonly() {
        Cell::new(&field.key).fg(Color::DarkGrey)
    } else {
        Cell::new(&field.key).add_attribute(Attribute::Bold)
    }
}

fn required_cell(required: bool) -> Cell {
    if required {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("-")
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
