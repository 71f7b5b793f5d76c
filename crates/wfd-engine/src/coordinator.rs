//! Run coordinator: drives every record through normalize → resolve →
//! synthesize → merge → dispatch.
//!
//! A record that fails at any stage is reported and the run moves on; only a
//! broken mapping document (raised before the coordinator exists) stops a
//! run.

use std::collections::HashMap;

use tracing::{Instrument, debug, error, info, info_span, warn};
use wfd_core::{
  claim::StatementSet,
  config::RunConfiguration,
  entity::{EntityId, Target},
  plan::WritePlan,
  record::HarvestedRecord,
  store::{KnowledgeBaseReader, KnowledgeBaseWriter, PreviewRenderer},
};

use crate::{
  error::{RecordError, Result},
  mapping::MappingTable,
  merge::merge,
  normalize::Normalizer,
  resolve::EntityResolver,
  synthesize::Synthesizer,
};

// ─── Sinks ───────────────────────────────────────────────────────────────────

/// Where computed write plans go. Exactly one sink is used per run.
pub enum Sink<'a, W> {
  /// Compute and discard.
  DryRun,
  /// Render each plan; the pages are collected for the caller to write out.
  Preview {
    renderer: &'a dyn PreviewRenderer,
    pages:    Vec<String>,
  },
  /// Apply to the knowledge base.
  Live(&'a W),
}

impl<'a, W: KnowledgeBaseWriter> Sink<'a, W> {
  pub fn preview(renderer: &'a dyn PreviewRenderer) -> Self {
    Self::Preview { renderer, pages: Vec::new() }
  }

  /// The rendered preview pages, joined in dispatch order.
  pub fn preview_text(&self) -> Option<String> {
    match self {
      Self::Preview { pages, .. } => Some(pages.join("\n")),
      _ => None,
    }
  }

  async fn dispatch(&mut self, code: &str, plan: &WritePlan) -> Result<Outcome> {
    match self {
      Self::DryRun => Ok(Outcome::Discarded),
      Self::Preview { renderer, pages } => {
        pages.push(renderer.render(code, plan));
        Ok(Outcome::Previewed)
      }
      Self::Live(writer) => apply(*writer, plan).await,
    }
  }
}

async fn apply<W: KnowledgeBaseWriter>(writer: &W, plan: &WritePlan) -> Result<Outcome> {
  let write_err = |e: W::Error| RecordError::Write(Box::new(e));
  match plan.target {
    Target::New => {
      let id = writer
        .create_entity(&plan.terms, &plan.statements)
        .await
        .map_err(write_err)?;
      Ok(Outcome::Created(id))
    }
    Target::Existing(id) if plan.is_empty() => Ok(Outcome::Unchanged(id)),
    Target::Existing(id) => {
      if !plan.statements.is_empty() {
        writer.add_statements(id, &plan.statements).await.map_err(write_err)?;
      }
      if !plan.sourced.is_empty() {
        writer.add_references(id, &plan.sourced).await.map_err(write_err)?;
      }
      if !plan.terms.is_empty() {
        writer.add_terms(id, &plan.terms).await.map_err(write_err)?;
      }
      Ok(Outcome::Updated(id))
    }
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// What happened to one record.
#[derive(Debug)]
pub enum Outcome {
  Created(EntityId),
  Updated(EntityId),
  /// The entity already matched; nothing was written.
  Unchanged(EntityId),
  Previewed,
  /// Dry run: the plan was computed and dropped.
  Discarded,
  /// No matching entity and creation is not allowed.
  Skipped,
  Failed(RecordError),
}

#[derive(Debug)]
pub struct RecordOutcome {
  /// The record's unique code, when it got far enough to have one.
  pub code:        Option<String>,
  pub outcome:     Outcome,
  /// Statements in the plan flagged provisional.
  pub provisional: usize,
}

/// Summary of a run.
#[derive(Debug, Default)]
pub struct RunReport {
  pub records:    Vec<RecordOutcome>,
  /// Records that reached the dispatch stage; this is what the cutoff counts.
  pub dispatched: usize,
  /// `(category, code)` pairs found unmapped by the up-front audit.
  pub unmapped:   Vec<(String, String)>,
}

impl RunReport {
  fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
    self.records.iter().filter(|r| pred(&r.outcome)).count()
  }

  pub fn created(&self) -> usize {
    self.count(|o| matches!(o, Outcome::Created(_)))
  }

  pub fn updated(&self) -> usize {
    self.count(|o| matches!(o, Outcome::Updated(_)))
  }

  pub fn unchanged(&self) -> usize {
    self.count(|o| matches!(o, Outcome::Unchanged(_)))
  }

  pub fn skipped(&self) -> usize { self.count(|o| matches!(o, Outcome::Skipped)) }

  pub fn failed(&self) -> usize { self.count(|o| matches!(o, Outcome::Failed(_))) }

  pub fn provisional(&self) -> usize {
    self.records.iter().map(|r| r.provisional).sum()
  }
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

/// Runs one import over a list of harvested records.
pub struct Coordinator<'a, R> {
  config: &'a RunConfiguration,
  table:  &'a MappingTable,
  reader: &'a R,
}

impl<'a, R: KnowledgeBaseReader> Coordinator<'a, R> {
  pub fn new(
    config: &'a RunConfiguration,
    table: &'a MappingTable,
    reader: &'a R,
  ) -> Self {
    Self { config, table, reader }
  }

  /// Process `records` in order, dispatching plans to `sink`, until the
  /// input or the cutoff is exhausted.
  pub async fn run<W: KnowledgeBaseWriter>(
    &self,
    records: &[HarvestedRecord],
    sink: &mut Sink<'_, W>,
  ) -> RunReport {
    let normalizer = Normalizer::new(self.table, self.config);
    let synthesizer = Synthesizer::new(self.table, self.config.year);
    let mut resolver =
      EntityResolver::new(self.reader, self.table.kind().identifier_property());
    // What dry-run and preview sinks would have created, by unique code.
    let mut pending = HashMap::new();

    let mut report = RunReport {
      unmapped: normalizer.audit(records),
      ..RunReport::default()
    };
    for (category, code) in &report.unmapped {
      warn!(%category, %code, "value is not mapped; records using it will fail");
    }

    info!(
      kind = %self.table.kind(),
      records = records.len(),
      cutoff = ?self.config.cutoff,
      "starting run"
    );

    for (index, record) in records.iter().enumerate() {
      if self.config.cutoff.is_some_and(|cutoff| report.dispatched >= cutoff) {
        info!(remaining = records.len() - index, "cutoff reached");
        break;
      }

      let code = record.get(self.table.kind().code_field()).map(str::to_string);
      let span = info_span!("record", index, code = code.as_deref().unwrap_or("-"));
      let step = Step {
        normalizer:  &normalizer,
        synthesizer: &synthesizer,
        reader:      self.reader,
        config:      self.config,
      };
      let result = step
        .process(record, &mut resolver, &mut pending, sink)
        .instrument(span.clone())
        .await;
      let (outcome, provisional) = span.in_scope(|| {
        let (outcome, provisional) = match result {
          Ok(Processed { outcome, provisional, dispatched }) => {
            report.dispatched += usize::from(dispatched);
            (outcome, provisional)
          }
          Err(Failure { error, dispatched }) => {
            report.dispatched += usize::from(dispatched);
            error!(%error, "record failed");
            (Outcome::Failed(error), 0)
          }
        };
        debug!(?outcome, "record done");
        (outcome, provisional)
      });
      report.records.push(RecordOutcome { code, outcome, provisional });
    }

    info!(
      dispatched = report.dispatched,
      created = report.created(),
      updated = report.updated(),
      unchanged = report.unchanged(),
      skipped = report.skipped(),
      failed = report.failed(),
      provisional = report.provisional(),
      "run finished"
    );
    report
  }
}

struct Processed {
  outcome:     Outcome,
  provisional: usize,
  dispatched:  bool,
}

struct Failure {
  error:      RecordError,
  dispatched: bool,
}

impl From<RecordError> for Failure {
  fn from(error: RecordError) -> Self { Self { error, dispatched: false } }
}

/// The per-record pipeline, borrowing the run's shared stages.
struct Step<'s, R> {
  normalizer:  &'s Normalizer<'s>,
  synthesizer: &'s Synthesizer<'s>,
  reader:      &'s R,
  config:      &'s RunConfiguration,
}

impl<R: KnowledgeBaseReader> Step<'_, R> {
  async fn process<W: KnowledgeBaseWriter>(
    &self,
    record: &HarvestedRecord,
    resolver: &mut EntityResolver<'_, R>,
    pending: &mut HashMap<String, StatementSet>,
    sink: &mut Sink<'_, W>,
  ) -> std::result::Result<Processed, Failure> {
    let mut canonical = self.normalizer.normalize(record)?;

    let resolution = resolver
      .resolve(&canonical.unique_code, self.config.policy)
      .await?;
    let Some(target) = resolution.target() else {
      info!("no matching entity and creation is disabled; skipped");
      return Ok(Processed {
        outcome:     Outcome::Skipped,
        provisional: 0,
        dispatched:  false,
      });
    };

    if let Some(link) = canonical.parent.clone() {
      let parent = resolver
        .resolve_existing(link.identifier_property, &link.code)
        .await?
        .ok_or(RecordError::UnknownParent { code: link.code })?;
      canonical.link_parent(parent);
    }

    let wanted = self.synthesizer.synthesize(&canonical);
    let existing = match target.entity_id() {
      Some(id) => self
        .reader
        .fetch_statement_set(id)
        .await
        .map_err(|e| RecordError::Read(Box::new(e)))?,
      // A creation planned earlier in this run but never written.
      None => pending.get(&canonical.unique_code).cloned().unwrap_or_default(),
    };
    let plan = merge(target, &existing, &wanted);

    let provisional = plan.provisional_count();
    if provisional > 0 {
      warn!(provisional, "plan contains provisional statements; review before trusting");
    }

    let outcome = sink
      .dispatch(&canonical.unique_code, &plan)
      .await
      .map_err(|error| Failure { error, dispatched: true })?;
    match &outcome {
      Outcome::Created(id) => {
        info!(%id, "created entity");
        resolver.record_created(&canonical.unique_code, *id);
      }
      Outcome::Previewed | Outcome::Discarded if target == Target::New => {
        absorb(pending.entry(canonical.unique_code).or_default(), &plan);
      }
      _ => {}
    }

    Ok(Processed { outcome, provisional, dispatched: true })
  }
}

/// Fold a plan that was not written into the state its entity would have.
fn absorb(pending: &mut StatementSet, plan: &WritePlan) {
  pending.statements.extend(plan.statements.iter().cloned());
  for sourced in &plan.sourced {
    let key = sourced.claim_key();
    if let Some(current) =
      pending.statements.iter_mut().find(|s| s.claim_key() == key)
    {
      current.references.extend(sourced.references.iter().cloned());
    }
  }

  let terms = &mut pending.terms;
  for (language, label) in &plan.terms.labels {
    terms.labels.entry(language.clone()).or_insert_with(|| label.clone());
  }
  for (language, text) in &plan.terms.descriptions {
    terms
      .descriptions
      .entry(language.clone())
      .or_insert_with(|| text.clone());
  }
  for (language, aliases) in &plan.terms.aliases {
    for alias in aliases {
      terms.add_alias(language, alias);
    }
  }
}
