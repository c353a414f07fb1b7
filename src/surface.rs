use std::io::Write;

use crate::EnrichedContact;

/// Something that shows contacts, e.g. a map window.
///
/// The ingest loop runs on the same task as the surface, so [`tick`] is called
/// whenever no datagram arrived within the poll interval. Surfaces that need a
/// redraw loop do their work there and must return quickly.
///
/// [`tick`]: Surface::tick
pub trait Surface {
    fn tick(&mut self) {}

    fn show(&mut self, contact: &EnrichedContact);
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn tick(&mut self) {
        S::tick(*self)
    }

    fn show(&mut self, contact: &EnrichedContact) {
        S::show(*self, contact)
    }
}

/// Prints a summary of each contact.
#[derive(Debug)]
pub struct ConsoleSurface<W> {
    writer: W,
}

impl ConsoleSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_contact(&mut self, contact: &EnrichedContact) -> std::io::Result<()> {
        let time = contact.confirmed_at.format("%Y-%m-%d %H:%M");
        writeln!(self.writer, "QSO confirmed on {time} UTC")?;
        writeln!(self.writer, "call: {}", contact.contact.callsign)?;
        if contact.looked_up {
            writeln!(self.writer, "name: {}", contact.contact.name)?;
            if !contact.contact.qth.is_empty() {
                writeln!(self.writer, "{}", contact.contact.qth)?;
            }
        }
        writeln!(self.writer, "gridsquare: {}", contact.contact.gridsquare)?;
        writeln!(self.writer, "distance: {}", contact.distance)?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

impl<W: Write> Surface for ConsoleSurface<W> {
    fn show(&mut self, contact: &EnrichedContact) {
        if let Err(error) = self.write_contact(contact) {
            tracing::warn!(?error, "failed to print contact");
        }
    }
}
