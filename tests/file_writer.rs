use json_log_writer::context::LogContext;
use json_log_writer::file_sink::FileSink;
use json_log_writer::record::{Level, LogRecord};
use json_log_writer::sink::AppendSink;
use json_log_writer::writer::JsonWriter;
use std::fs;
use std::sync::Arc;

fn writer_for(path: &std::path::Path) -> (Arc<JsonWriter>, Arc<LogContext>) {
    let sink = Arc::new(FileSink::open(path).expect("open log file"));
    let context = Arc::new(LogContext::new());
    let writer = JsonWriter::new(sink as Arc<dyn AppendSink>, Arc::clone(&context));
    (Arc::new(writer), context)
}

#[test]
fn appends_one_parseable_line_per_record() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("app.log");
    let (writer, context) = writer_for(&path);
    context.add("tenant", "acme");

    writer
        .write_log(&LogRecord::new(Level::Info, "first").with_component("A"))
        .unwrap();
    writer
        .write_log(&LogRecord::new(Level::Error, "second").with_component("B"))
        .unwrap();

    let contents = fs::read_to_string(&path).expect("read log file");
    assert!(contents.ends_with('\n'));

    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["tenant"], "acme");
    assert_eq!(first["level"], "INFO");
    assert_eq!(first["message"], "first");
    assert_eq!(first["component"], "A");

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["level"], "ERROR");
    assert_eq!(second["component"], "B");
}

#[test]
fn context_reset_between_units_of_work_stops_tag_leakage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("app.log");
    let (writer, context) = writer_for(&path);

    context.add("requestTag", "r-1");
    writer.write_log(&LogRecord::new(Level::Info, "in request")).unwrap();
    context.reset();
    writer.write_log(&LogRecord::new(Level::Info, "after request")).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines[0]["requestTag"], "r-1");
    assert!(lines[1].get("requestTag").is_none());
}

#[test]
fn concurrent_writers_never_interleave_lines() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("app.log");
    let (writer, _) = writer_for(&path);

    let threads: Vec<_> = (0..8)
        .map(|i| {
            let writer = Arc::clone(&writer);
            std::thread::spawn(move || {
                for j in 0..50 {
                    let record = LogRecord::new(Level::Info, format!("thread {i} line {j}"))
                        .with_context("thread", format!("{i}"));
                    writer.write_log(&record).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 8 * 50);
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).expect("well-formed line");
        assert!(value["message"].as_str().unwrap().starts_with("thread "));
    }
}
