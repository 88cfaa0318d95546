use sysgate_interpreter::summary::memory_percent;
use sysgate_interpreter::{
    interpret, sort_rows, Interpretation, ResultShape, SortDirection, StructuredResult,
    NO_DATA_PARSED,
};

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}

const PS_MEM: &str = "USER       PID  %CPU %MEM    VSZ   RSS TTY      STAT START   TIME COMMAND
postgres   812   1.0 12.4 981234 124000 ?       Ss   08:00   3:10 postgres: checkpointer
node      2048   4.2  8.1 892416 81920 ?        Sl   08:02   2:15 node server.js
root         1   0.0  0.1 169324 13212 ?        Ss   08:00   0:03 /sbin/init";

#[test]
fn ps_table_with_declared_columns() {
    let columns = cols(&[
        "USER", "PID", "%CPU", "%MEM", "VSZ", "RSS", "TTY", "STAT", "START", "TIME", "COMMAND",
    ]);
    let parsed = interpret(PS_MEM, Some(ResultShape::Table), &columns);
    assert_eq!(parsed.shape, ResultShape::Table);
    // Header consumed, not counted as data.
    assert_eq!(parsed.rows.len(), PS_MEM.lines().count() - 1);
    assert_eq!(parsed.rows[0][10], "postgres: checkpointer");
}

#[test]
fn ps_table_inferred_without_hint() {
    let parsed = interpret(PS_MEM, None, &[]);
    assert_eq!(parsed.shape, ResultShape::Table);
    assert_eq!(parsed.columns[3], "%MEM");
    assert_eq!(parsed.rows.len(), 3);
}

#[test]
fn df_progress_scenario() {
    let parsed = interpret(
        "/dev/sda1  50G  32G  18G  64% /",
        Some(ResultShape::ProgressBar),
        &[],
    );
    assert_eq!(parsed.shape, ResultShape::ProgressBar);
    assert_eq!(parsed.rows.len(), 1);
    assert_eq!(parsed.rows[0][0], "/dev/sda1 → /");
    assert_eq!(parsed.rows[0][1], "64");
}

#[test]
fn meminfo_is_not_key_value() {
    let raw = "MemTotal: 16384000 kB\nMemFree: 4096000 kB";
    let inferred = interpret(raw, None, &[]);
    assert_eq!(inferred.shape, ResultShape::PlainText);
    assert_eq!(inferred.rows.len(), 2);

    let hinted = interpret(raw, Some(ResultShape::KeyValue), &cols(&["Key", "Value"]));
    assert_eq!(hinted.shape, ResultShape::PlainText);
}

#[test]
fn free_row_and_memory_percent_agree() {
    let line = "Mem:  16384  11000  5384";
    let parsed = interpret(line, Some(ResultShape::Table), &cols(&["total", "used", "free"]));
    assert_eq!(parsed.rows, vec![vec!["16384", "11000", "5384"]]);
    let percent = memory_percent(line).unwrap();
    assert_eq!(format!("{:.1}", percent), "67.1");
}

#[test]
fn env_listing_inferred_as_key_value() {
    let parsed = interpret("HOME=/root\nPATH=/usr/bin:/bin\n[2 more omitted]", None, &[]);
    assert_eq!(parsed.shape, ResultShape::KeyValue);
    assert_eq!(parsed.columns, vec!["KEY", "VALUE"]);
    assert_eq!(parsed.rows.len(), 2);
}

#[test]
fn empty_output_reports_no_data_marker() {
    let interpretation = interpret("", None, &[]);
    let result = StructuredResult::from_interpretation("q", "uptime", "system", "", interpretation);
    assert!(result.rows.is_empty());
    assert_eq!(result.note, NO_DATA_PARSED);
    assert!(result.is_safe);
}

#[test]
fn sort_table_by_memory_descending() {
    let columns = cols(&[
        "USER", "PID", "%CPU", "%MEM", "VSZ", "RSS", "TTY", "STAT", "START", "TIME", "COMMAND",
    ]);
    let Interpretation { mut rows, .. } = interpret(PS_MEM, Some(ResultShape::Table), &columns);
    sort_rows(&mut rows, 3, SortDirection::Ascending);
    let users: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(users, vec!["root", "node", "postgres"]);

    sort_rows(&mut rows, 3, SortDirection::Descending);
    let users: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(users, vec!["postgres", "node", "root"]);
}

#[test]
fn structured_result_wire_shape_is_flat() {
    let parsed = interpret("/dev/sda1  50G  32G  18G  64% /", None, &[]);
    let result = StructuredResult::from_interpretation(
        "disk usage",
        "df -h",
        "disk",
        "/dev/sda1  50G  32G  18G  64% /",
        parsed,
    );
    let json = serde_json::to_value(&result).unwrap();
    let object = json.as_object().unwrap();
    for (key, value) in object {
        let flat = value.is_string()
            || value.is_boolean()
            || value
                .as_array()
                .map(|items| items.iter().all(|i| i.is_string() || i.is_array()))
                .unwrap_or(false);
        assert!(flat, "{} is nested", key);
    }
    assert_eq!(json["result_type"], "progress_bar");
}
