//! Snapshot renderers: full-screen terminal table and JSON lines

use canqv_core::event_log::format_identifier;
use canqv_core::modules::{HIGH_SPEED_MODULES, LOW_SPEED_MODULES};
use canqv_core::types::MAX_DLC;
use canqv_core::{Addressing, AnnotatedEntry, MonitorError, RenderSnapshot, Renderer};
use std::io::Write;

// Terminal codes
const CLR_SCREEN: &str = "\x1b[2J";
const CSR_HOME: &str = "\x1b[H";
const ATTRESET: &str = "\x1b[0m";
const ATTBOLD: &str = "\x1b[1m";

const LEGEND: &[&str] = &[
    "          .----------------------- Message length",
    "          |  .-------------------- Module id (list below)",
    "          |  |  .----------------- Read Data Block By Offset",
    "          |  |  |  .---- Identify (?)",
    "          |  |  |  |",
    "          |  |  |  |",
    "000FFFFE CB xx B9 F0 00 00 00 00",
    "00 0F FF FE: The identifier VIDA (or any other diagnostic module) uses for messaging.",
    "Message length: High nibble seems to be always 'C' in command message. Low nibble: Bit 3 is always on. Bits 0-2 is the actual message length (excluding the first byte).",
    "",
];

/// Redraws the whole screen for every snapshot
pub struct TextRenderer<W: Write> {
    out: W,
    reference: bool,
    clear: bool,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, reference: bool) -> Self {
        Self {
            out,
            reference,
            clear: true,
        }
    }

    /// Skip the clear-screen sequence (for piping into a file)
    pub fn without_clear(mut self) -> Self {
        self.clear = false;
        self
    }

    fn write_snapshot(&mut self, snapshot: &RenderSnapshot) -> std::io::Result<()> {
        if self.clear {
            writeln!(self.out, "{}{}{}", CLR_SCREEN, ATTRESET, CSR_HOME)?;
        }
        if self.reference {
            for line in LEGEND {
                writeln!(self.out, "{}", line)?;
            }
        }

        for annotated in &snapshot.entries {
            writeln!(self.out, "{}", format_row(annotated))?;
        }

        if self.reference {
            self.write_reference()?;
        }
        self.out.flush()
    }

    fn write_reference(&mut self) -> std::io::Result<()> {
        writeln!(self.out)?;
        for module in LOW_SPEED_MODULES {
            let Some(address) = module.address else {
                continue;
            };
            writeln!(
                self.out,
                "{:02x} {:02x} {:02x} {:02x} :: {:02x}  {}, {}",
                address[0],
                address[1],
                address[2],
                address[3],
                module.code,
                module.mnemonic,
                module.description
            )?;
            if module.mnemonic == "CEM" {
                writeln!(self.out, "                   (also answers queries related to CPM(heater)")?;
            }
        }
        writeln!(self.out)?;
        for module in HIGH_SPEED_MODULES {
            writeln!(
                self.out,
                "{:02x}  {}, {}",
                module.code, module.mnemonic, module.description
            )?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, snapshot: &RenderSnapshot) -> canqv_core::Result<()> {
        self.write_snapshot(snapshot).map_err(MonitorError::Render)
    }
}

/// One table row: identifier, payload cells, age, period
pub fn format_row(annotated: &AnnotatedEntry) -> String {
    let entry = &annotated.entry;
    let mut row = String::new();

    if entry.dirty {
        row.push_str(ATTBOLD);
    }
    match annotated.addressing {
        Addressing::Extended => row.push_str(&format!("{}:", format_identifier(entry.can_id))),
        Addressing::Standard => row.push_str(&format!("     {}:", format_identifier(entry.can_id))),
    }

    let payload = entry.payload();
    for (index, byte) in payload.iter().enumerate() {
        match annotated.module {
            Some(name) if index == 1 => row.push_str(&format!(" {:>3} ", name)),
            _ => row.push_str(&format!(" {:02x}  ", byte)),
        }
    }
    for _ in payload.len()..MAX_DLC {
        row.push_str(" --");
    }

    row.push_str(&format!("\tlast=-{:.3}s", annotated.age));
    if let Some(period) = entry.period {
        row.push_str(&format!("\tperiod={:.3}s", period));
    }
    if entry.dirty {
        row.push_str(ATTRESET);
    }
    row
}

/// Writes each snapshot as one JSON line
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, snapshot: &RenderSnapshot) -> canqv_core::Result<()> {
        serde_json::to_writer(&mut self.out, snapshot)
            .map_err(|e| MonitorError::Render(e.into()))?;
        writeln!(self.out).map_err(MonitorError::Render)?;
        self.out.flush().map_err(MonitorError::Render)
    }
}
