//! The triage engine: complaint lifecycle plus the access-checked
//! operations the service layer calls.
//!
//! CREATE ORDER (fixed):
//!   1. Validate text.
//!   2. Classify (outside any transaction; failure → Other / Medium).
//!   3. Open transaction (immediate when allocation is serialized).
//!   4. Read the active support roster and the allocation counter.
//!   5. Allocate, insert, append audit events, commit.
//!
//! RULES:
//!   - Inactive actors are rejected before any role check.
//!   - Every single-complaint operation goes through `access::can_access`.
//!   - List scopes in SQL with `ReadScope`, never by post-filtering.
//!   - Any storage error drops the open transaction, which rolls it back.

use crate::{
    access::{can_access, AccessDecision, DenyReason, Operation, ReadScope},
    actor::{Actor, ActorDirectory, Role},
    allocator::{allocate, AllocationMode},
    analytics::{self, BasicStats, CategoryRelationships, TimeTrends, WordCount},
    classifier::{self, ClassifierPort, KeywordClassifier, Prediction, TimeoutClassifier},
    clock::{next_update_time, Clock, SteppingClock, SystemClock},
    complaint::{Complaint, ComplaintUpdate, NewComplaint},
    config::DeskConfig,
    error::{TriageError, TriageResult},
    event::{DeskEvent, EventLogEntry},
    query::{ComplaintFilter, ListResult, Page},
    store::DeskStore,
    types::ComplaintId,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct TriageEngine {
    store: DeskStore,
    classifier: Box<dyn ClassifierPort>,
    clock: Box<dyn Clock>,
    config: DeskConfig,
}

impl TriageEngine {
    pub fn new(
        store: DeskStore,
        classifier: Box<dyn ClassifierPort>,
        clock: Box<dyn Clock>,
        config: DeskConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            clock,
            config,
        }
    }

    /// Production wiring: keyword classifier behind the configured timeout,
    /// wall clock.
    pub fn build(store: DeskStore, config: DeskConfig) -> Self {
        let keyword: Arc<dyn ClassifierPort> =
            Arc::new(KeywordClassifier::new(config.classifier_rules.clone()));
        let classifier = TimeoutClassifier::new(keyword, config.classifier_timeout());
        Self::new(store, Box::new(classifier), Box::new(SystemClock), config)
    }

    /// Migrated in-memory store, test config, keyword classifier and a
    /// stepping clock.
    pub fn build_test() -> TriageResult<Self> {
        Self::build_test_with(DeskConfig::default_test())
    }

    pub fn build_test_with(config: DeskConfig) -> TriageResult<Self> {
        let store = DeskStore::in_memory()?;
        store.migrate()?;
        let classifier = KeywordClassifier::new(config.classifier_rules.clone());
        Ok(Self::new(
            store,
            Box::new(classifier),
            Box::new(SteppingClock::default_test()),
            config,
        ))
    }

    pub fn store(&self) -> &DeskStore {
        &self.store
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Classify, allocate and persist a new complaint. Classifier failure
    /// and an empty support roster are both absorbed here.
    pub fn create(&self, text: &str, creator: &str) -> TriageResult<Complaint> {
        self.validate_text(text)?;

        let (prediction, fallback_reason) = match classifier::classify(self.classifier.as_ref(), text) {
            Ok(p) => (p, None),
            Err(e) => {
                log::warn!("classification failed for new complaint by {creator}: {e}; using Other/Medium");
                (Prediction::fallback(), Some(e.to_string()))
            }
        };

        let serialized = self.config.allocation_mode == AllocationMode::Sequence;
        let tx = self.store.begin(serialized)?;

        let roster = self.store.list_active_actors_by_role(Role::Support)?;
        let counter = match self.config.allocation_mode {
            AllocationMode::LiveCount => self.store.complaint_count()?,
            AllocationMode::Sequence => self.store.next_allocation_counter()?,
        };
        let allocation = allocate(&roster, counter, &self.config.unassigned_identity);
        let degraded = allocation.is_degraded();

        let complaint = self.store.insert_complaint(&NewComplaint {
            text: text.to_string(),
            created_by: creator.to_string(),
            category: prediction.category,
            urgency: prediction.urgency,
            assigned_to: allocation.into_identity(),
            created_at: self.clock.now(),
        })?;

        let mut events = vec![DeskEvent::ComplaintFiled {
            complaint_id: complaint.id,
            created_by: complaint.created_by.clone(),
            category: complaint.category.to_string(),
            urgency: complaint.urgency.to_string(),
            assigned_to: complaint.assigned_to.clone().unwrap_or_default(),
        }];
        if let Some(reason) = fallback_reason {
            events.push(DeskEvent::ClassificationFallback {
                complaint_id: complaint.id,
                reason,
            });
        }
        if degraded {
            log::warn!(
                "complaint={} no active support actors, assigned to placeholder {}",
                complaint.id,
                self.config.unassigned_identity
            );
            events.push(DeskEvent::AllocationDegraded {
                complaint_id: complaint.id,
                placeholder: self.config.unassigned_identity.clone(),
            });
        }
        self.record(&events, creator, complaint.created_at)?;

        tx.commit()?;
        log::info!(
            "complaint={} filed by={} category={} urgency={} assigned_to={} counter={counter}",
            complaint.id,
            complaint.created_by,
            complaint.category,
            complaint.urgency,
            complaint.assigned_to.as_deref().unwrap_or("-"),
        );
        Ok(complaint)
    }

    pub fn get(&self, id: ComplaintId) -> TriageResult<Complaint> {
        self.store
            .get_complaint(id)?
            .ok_or_else(|| TriageError::complaint_not_found(id))
    }

    /// PATCH semantics: only fields present in `changes` are written.
    /// `updated_at` is always moved strictly forward. An empty update
    /// returns the stored complaint untouched.
    pub fn update(&self, id: ComplaintId, changes: &ComplaintUpdate, actor: &str) -> TriageResult<Complaint> {
        self.validate_update(changes)?;

        let tx = self.store.begin(false)?;
        let mut complaint = self.get(id)?;
        if changes.is_empty() {
            return Ok(complaint);
        }

        changes.apply_to(&mut complaint);
        complaint.updated_at = next_update_time(complaint.updated_at, self.clock.now());
        if !self.store.save_complaint(&complaint)? {
            return Err(TriageError::complaint_not_found(id));
        }

        let fields: Vec<String> = changes.changed_fields().into_iter().map(String::from).collect();
        self.record(
            &[DeskEvent::ComplaintUpdated {
                complaint_id: id,
                fields: fields.clone(),
            }],
            actor,
            complaint.updated_at,
        )?;
        tx.commit()?;

        log::info!("complaint={id} updated by={actor} fields={}", fields.join(","));
        Ok(complaint)
    }

    /// Hard delete. Returns false when no such complaint existed.
    pub fn delete(&self, id: ComplaintId, actor: &str) -> TriageResult<bool> {
        let tx = self.store.begin(false)?;
        if !self.store.delete_complaint(id)? {
            return Ok(false);
        }
        self.record(&[DeskEvent::ComplaintDeleted { complaint_id: id }], actor, self.clock.now())?;
        tx.commit()?;
        log::info!("complaint={id} deleted by={actor}");
        Ok(true)
    }

    /// Classification preview. Nothing is stored, so a classifier failure
    /// is returned to the caller instead of being replaced by defaults.
    pub fn classify_only(&self, text: &str) -> TriageResult<Prediction> {
        self.validate_text(text)?;
        classifier::classify(self.classifier.as_ref(), text)
    }

    /// Scoped, filtered page. An inactive actor lists nothing: the read
    /// rule denies them every complaint.
    pub fn list(&self, actor: &Actor, filter: &ComplaintFilter, page: Page) -> TriageResult<ListResult> {
        if !actor.is_active {
            log::warn!("denied list to inactive actor {}", actor.email);
            return Err(TriageError::Forbidden {
                reason: DenyReason::InactiveActor,
            });
        }
        page.validate(self.config.max_page_limit)?;
        let filter = filter.clone().normalized();
        let scope = ReadScope::for_actor(actor);
        let items = self.store.list_complaints(&scope, &filter, page)?;
        let total = self.store.count_complaints(&scope, &filter)?;
        Ok(ListResult { items, total })
    }

    // ── Inbound operations ─────────────────────────────────────────

    pub fn create_complaint(&self, text: &str, identity: &str) -> TriageResult<Complaint> {
        let actor = self.authenticate(identity)?;
        self.create(text, &actor.email)
    }

    pub fn get_complaint(&self, id: ComplaintId, identity: &str) -> TriageResult<Complaint> {
        let actor = self.authenticate(identity)?;
        let complaint = self.get(id)?;
        self.authorize(&actor, &complaint, Operation::Read)?;
        Ok(complaint)
    }

    /// `page = None` means the first page at the configured default size.
    pub fn list_complaints(
        &self,
        identity: &str,
        filter: &ComplaintFilter,
        page: Option<Page>,
    ) -> TriageResult<ListResult> {
        let actor = self.authenticate(identity)?;
        let page = page.unwrap_or(Page::new(0, self.config.default_page_limit));
        self.list(&actor, filter, page)
    }

    pub fn update_complaint(
        &self,
        id: ComplaintId,
        identity: &str,
        changes: &ComplaintUpdate,
    ) -> TriageResult<Complaint> {
        let actor = self.authenticate(identity)?;
        let complaint = self.get(id)?;
        self.authorize(&actor, &complaint, Operation::Update)?;
        self.update(id, changes, &actor.email)
    }

    pub fn delete_complaint(&self, id: ComplaintId, identity: &str) -> TriageResult<()> {
        let actor = self.authenticate(identity)?;
        let complaint = self.get(id)?;
        self.authorize(&actor, &complaint, Operation::Delete)?;
        if self.delete(id, &actor.email)? {
            Ok(())
        } else {
            Err(TriageError::complaint_not_found(id))
        }
    }

    pub fn classify_text(&self, text: &str) -> TriageResult<Prediction> {
        self.classify_only(text)
    }

    /// Audit trail of a complaint the actor may read. Events outlive a
    /// deleted complaint but are then only visible to admins.
    pub fn complaint_events(&self, id: ComplaintId, identity: &str) -> TriageResult<Vec<EventLogEntry>> {
        let actor = self.authenticate(identity)?;
        match self.store.get_complaint(id)? {
            Some(complaint) => self.authorize(&actor, &complaint, Operation::Read)?,
            None if actor.role == Role::Admin => {}
            None => return Err(TriageError::complaint_not_found(id)),
        }
        self.store.events_for_complaint(id)
    }

    // ── Analytics ──────────────────────────────────────────────────

    pub fn basic_stats(&self, identity: &str) -> TriageResult<BasicStats> {
        let rows = self.scoped_rows(identity)?;
        Ok(analytics::basic_stats(&rows, &self.config.unassigned_identity))
    }

    pub fn category_relationships(&self, identity: &str) -> TriageResult<CategoryRelationships> {
        let rows = self.scoped_rows(identity)?;
        Ok(analytics::category_relationships(&rows))
    }

    pub fn time_trends(&self, identity: &str) -> TriageResult<TimeTrends> {
        let rows = self.scoped_rows(identity)?;
        Ok(analytics::time_trends(&rows))
    }

    /// Most frequent words across the complaint texts in scope.
    pub fn word_frequency(&self, identity: &str, limit: usize) -> TriageResult<Vec<WordCount>> {
        let rows = self.scoped_rows(identity)?;
        Ok(analytics::word_frequency(&rows, limit))
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn scoped_rows(&self, identity: &str) -> TriageResult<Vec<Complaint>> {
        let actor = self.authenticate(identity)?;
        self.store.scoped_complaints(&ReadScope::for_actor(&actor))
    }

    /// Resolve an identity to an active actor.
    pub fn authenticate(&self, identity: &str) -> TriageResult<Actor> {
        let actor = self
            .store
            .get_actor_by_identity(identity)?
            .ok_or_else(|| TriageError::NotFound {
                entity: "actor",
                id: identity.to_string(),
            })?;
        if !actor.is_active {
            log::warn!("rejected inactive actor {identity}");
            return Err(TriageError::Forbidden {
                reason: DenyReason::InactiveActor,
            });
        }
        Ok(actor)
    }

    fn authorize(&self, actor: &Actor, complaint: &Complaint, op: Operation) -> TriageResult<()> {
        match can_access(actor, complaint, op) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(reason) => {
                log::warn!(
                    "denied {} on complaint={} to {} ({}): {reason}",
                    op.as_str(),
                    complaint.id,
                    actor.email,
                    actor.role,
                );
                Err(TriageError::Forbidden { reason })
            }
        }
    }

    fn record(&self, events: &[DeskEvent], actor: &str, at: DateTime<Utc>) -> TriageResult<()> {
        for event in events {
            let entry = EventLogEntry::new(event, actor, at)?;
            self.store.append_event(&entry)?;
        }
        Ok(())
    }

    fn validate_text(&self, text: &str) -> TriageResult<()> {
        let len = text.trim().chars().count();
        if len < self.config.min_text_len {
            return Err(TriageError::validation(
                "text",
                format!("must be at least {} characters, got {len}", self.config.min_text_len),
            ));
        }
        Ok(())
    }

    fn validate_update(&self, changes: &ComplaintUpdate) -> TriageResult<()> {
        if let Some(text) = &changes.text {
            self.validate_text(text)?;
        }
        if let Some(assignee) = &changes.assigned_to {
            self.validate_assignee(assignee)?;
        }
        Ok(())
    }

    /// A reassignment must name an active support actor or the configured
    /// placeholder.
    fn validate_assignee(&self, assignee: &str) -> TriageResult<()> {
        if assignee.trim().is_empty() {
            return Err(TriageError::validation("assignedTo", "must not be empty"));
        }
        if assignee == self.config.unassigned_identity {
            return Ok(());
        }
        match self.store.get_actor_by_identity(assignee)? {
            Some(actor) if actor.role == Role::Support && actor.is_active => Ok(()),
            Some(actor) if actor.role != Role::Support => Err(TriageError::validation(
                "assignedTo",
                format!("'{assignee}' is a {} actor, not support", actor.role),
            )),
            Some(_) => Err(TriageError::validation(
                "assignedTo",
                format!("support actor '{assignee}' is inactive"),
            )),
            None => Err(TriageError::validation(
                "assignedTo",
                format!("no actor '{assignee}'"),
            )),
        }
    }
}
