use std::io::Write;

use fiducial_nav::{FrameReport, FrameSink};
use serde::Serialize;

use crate::replay::ReplayFrame;

#[derive(Serialize)]
struct ReportLine<'a> {
    frame: usize,
    #[serde(flatten)]
    report: &'a FrameReport,
}

/// Frame sink that logs each decision and optionally writes reports as JSON lines.
///
/// The JSON output carries the overlay instructions, so a viewer can redraw
/// the frame from it.
pub struct ReportSink {
    writer: Option<Box<dyn Write>>,
}

impl ReportSink {
    /// Sink that only logs.
    pub fn log_only() -> Self {
        Self { writer: None }
    }

    /// Sink that logs and writes one JSON report per frame to `writer`.
    pub fn with_writer(writer: impl Write + 'static) -> Self {
        Self {
            writer: Some(Box::new(writer)),
        }
    }
}

impl FrameSink<ReplayFrame> for ReportSink {
    type Error = std::io::Error;

    fn show(&mut self, frame: &ReplayFrame, report: &FrameReport) -> Result<(), std::io::Error> {
        match &report.decision {
            Some(d) => log::info!(
                "frame {}: marker {} at {:.1} cm, {}",
                frame.frame,
                d.marker_id,
                d.distance_cm,
                d.direction
                    .map_or_else(|| "idle".to_string(), |dir| dir.to_string())
            ),
            None => log::debug!(
                "frame {}: no target among {} markers",
                frame.frame,
                report.observations.len()
            ),
        }

        if let Some(writer) = self.writer.as_mut() {
            let line = ReportLine {
                frame: frame.frame,
                report,
            };
            serde_json::to_writer(&mut *writer, &line)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiducial_nav::{Direction, NavigationDecision};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn frame(index: usize) -> ReplayFrame {
        ReplayFrame {
            frame: index,
            width: 640,
            height: 480,
            markers: vec![],
        }
    }

    #[test]
    fn test_writes_one_line_per_frame() -> Result<(), Box<dyn std::error::Error>> {
        let buf = SharedBuf::default();
        let mut sink = ReportSink::with_writer(buf.clone());

        let decision = NavigationDecision {
            marker_id: 2,
            center: [320.0, 240.0],
            distance_cm: 7.5,
            direction: Some(Direction::Stop),
            band: None,
        };
        sink.show(&frame(0), &FrameReport::default())?;
        sink.show(
            &frame(1),
            &FrameReport {
                decision: Some(decision),
                ..Default::default()
            },
        )?;

        let text = String::from_utf8(buf.0.borrow().clone())?;
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(serde_json::from_str::<serde_json::Value>)
            .collect::<Result<_, _>>()?;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["frame"], 0);
        assert!(lines[0]["decision"].is_null());
        assert_eq!(lines[1]["decision"]["direction"], "stop");
        assert_eq!(lines[1]["decision"]["marker_id"], 2);
        Ok(())
    }

    #[test]
    fn test_log_only() -> Result<(), std::io::Error> {
        let mut sink = ReportSink::log_only();
        sink.show(&frame(0), &FrameReport::default())
    }
}
