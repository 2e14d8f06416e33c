//! Create a reservation locally and queue it for sync.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use std::path::Path;
use terrace_sync_client::Outbox;
use terrace_sync_types::{EventDetails, RequestKind, Reservation, ReservationDraft};

use crate::config::Config;
use crate::engine::open_store;

/// Longest bookable window, in hours.
pub const MAX_DURATION_HOURS: f64 = 24.0;

/// User input for a new reservation.
#[derive(Debug, Clone, Default)]
pub struct ReserveArgs {
    /// Owner reference.
    pub owner: String,
    /// Day, `YYYY-MM-DD`.
    pub date: String,
    /// Start, `HH:MM` or `HH:MM:SS`.
    pub start: String,
    /// Optional end, same format as `start`.
    pub end: Option<String>,
    /// `visit` or `event`.
    pub kind: Option<String>,
    /// Terrace reference.
    pub terrace: Option<String>,
    /// Terrace display name.
    pub terrace_name: Option<String>,
    /// Guest count.
    pub guests: Option<u32>,
    /// Duration in hours.
    pub duration: Option<f64>,
    /// Event type.
    pub event_type: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl ReserveArgs {
    /// Validate and convert into a draft.
    pub fn into_draft(self) -> Result<ReservationDraft> {
        if self.owner.trim().is_empty() {
            anyhow::bail!("--owner must not be empty");
        }

        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .with_context(|| format!("Invalid --date '{}', expected YYYY-MM-DD", self.date))?;
        let start_time = parse_time(&self.start).context("Invalid --start")?;
        let end_time = self
            .end
            .as_deref()
            .map(parse_time)
            .transpose()
            .context("Invalid --end")?;
        if let Some(hours) = self.duration {
            if !(hours.is_finite() && hours > 0.0 && hours <= MAX_DURATION_HOURS) {
                anyhow::bail!(
                    "Invalid --duration {}, expected more than 0 and at most {} hours",
                    hours,
                    MAX_DURATION_HOURS
                );
            }
        }
        let kind = match self.kind.as_deref() {
            Some(kind) => kind.parse::<RequestKind>()?,
            None => RequestKind::default(),
        };

        Ok(ReservationDraft {
            owner_id: self.owner,
            terrace_id: self.terrace,
            terrace_name: self.terrace_name,
            date,
            start_time,
            end_time,
            kind,
            event: EventDetails {
                event_type: self.event_type,
                guest_count: self.guests,
                duration_hours: self.duration,
                notes: self.notes,
            },
        })
    }
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .with_context(|| format!("'{}' is not HH:MM", value))
}

/// Run the reserve command.
pub async fn run(data_dir: &Path, config: &Config, args: ReserveArgs) -> Result<Reservation> {
    let draft = args.into_draft()?;
    let store = open_store(data_dir, config).await?;

    let reservation = Outbox::new(store)
        .create_reservation(draft)
        .await
        .context("Failed to queue reservation")?;

    println!("Reservation saved locally.");
    println!("  ID:     {}", reservation.id);
    println!("  Date:   {} {}", reservation.date, reservation.start_time.format("%H:%M"));
    println!("  Kind:   {}", reservation.kind);
    println!("  Status: pending sync");

    Ok(reservation)
}
