use crate::ReportWriter;
use std::io::Write;
use sweep_core::{ReportRow, ReportSink};

impl<W: Write> ReportSink for ReportWriter<W> {
    fn write_row(&mut self, row: &ReportRow) -> std::io::Result<()> {
        self.wtr.write_record([row.target.0.as_str(), row.rendered.as_str()])?;
        // rows stream to disk as they are produced
        self.wtr.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.wtr.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_core::QueryOutcome;

    fn render(rows: &[ReportRow]) -> String {
        let mut w = ReportWriter::from_writer(Vec::new()).unwrap();
        for r in rows { w.write_row(r).unwrap(); }
        w.finish().unwrap();
        assert_eq!(w.rows(), rows.len());
        String::from_utf8(w.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn empty_report_has_only_header() {
        assert_eq!(render(&[]), "Server Address,Serial Number\n");
    }

    #[test]
    fn rows_follow_header_and_are_quoted() {
        let rows = vec![
            ReportRow::new("10.0.0.1".into(), &QueryOutcome::Success("SN9".into())),
            ReportRow::new("h".into(), &QueryOutcome::MalformedResponse("a,b".into())),
        ];
        assert_eq!(render(&rows), "Server Address,Serial Number\n10.0.0.1,SN9\nh,\"UNEXPECTED RESPONSE: a,b\"\n");
    }

    #[test]
    fn create_truncates_existing_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "stale,data\nmore,stale\nrows,here\n").unwrap();
        let mut w = ReportWriter::create(&path).unwrap();
        w.write_row(&ReportRow::new("a".into(), &QueryOutcome::EmptyResponse)).unwrap();
        w.finish().unwrap();
        drop(w);
        let s = std::fs::read_to_string(&path).unwrap();
        assert!(!s.contains("stale"));
        assert_eq!(s.lines().count(), 2);
    }

    #[test]
    fn create_in_missing_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let e = ReportWriter::create(&dir.path().join("no/such/dir/results.csv")).err().unwrap();
        assert!(matches!(e, sweep_core::ConfigError::ReportUnwritable { .. }));
    }
}
