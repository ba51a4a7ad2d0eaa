//! Deterministic demo data.
//!
//! Provisions an admin, a support roster and employees, then files sample
//! complaints through the normal create path so they are classified and
//! allocated like real intake. A seeded subset is moved along the status
//! lifecycle by the admin.

use crate::{
    actor::{ActorDirectory, NewActor, Role},
    complaint::{ComplaintUpdate, Status},
    engine::TriageEngine,
    error::TriageResult,
    rng::SeedRng,
};
use serde::{Deserialize, Serialize};

pub const ADMIN_IDENTITY: &str = "admin@university.edu";

const SAMPLE_TEXTS: &[&str] = &[
    "The printer on the third floor is broken again and jams on every page.",
    "My laptop cannot connect to the office wifi since this morning.",
    "I forgot my password and the reset email never arrives.",
    "The heating in meeting room B has not worked for a week.",
    "There is a water leak under the sink in the kitchen area.",
    "My payslip shows the wrong overtime hours for last month.",
    "My salary was paid late for the second month in a row.",
    "The fire exit on level two is blocked by boxes, this is an emergency.",
    "The floor near the entrance is slippery and someone slipped today.",
    "My expense reimbursement has been pending for six weeks.",
    "The invoice for the catering order was charged twice.",
    "My access badge stopped working at the main entrance.",
    "Someone reported a theft from the staff lockers yesterday.",
    "Suggestion: could we get more plants in the open office, whenever possible.",
    "My manager keeps scheduling meetings during lunch breaks.",
    "We have run out of notebooks and pens in the supply cupboard.",
    "The lift between floors one and four is making grinding noises, urgent.",
    "Team morale is low after the restructuring and nobody explained it.",
];

const RESPONSES: &[&str] = &[
    "Thanks for reporting this, a technician has been scheduled.",
    "We have escalated this to the responsible team.",
    "This has been fixed, please let us know if it happens again.",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPlan {
    pub seed: u64,
    pub support: usize,
    pub employees: usize,
    pub complaints: usize,
    /// Probability that a seeded complaint is moved past Pending.
    pub progress_probability: f64,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            seed: 42,
            support: 10,
            employees: 20,
            complaints: 50,
            progress_probability: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub actors_added: usize,
    pub complaints_filed: usize,
    pub status_changes: usize,
}

pub fn support_identity(i: usize) -> String {
    format!("it-support-{i}@university.edu")
}

pub fn employee_identity(i: usize) -> String {
    format!("employee-{i}@university.edu")
}

/// Insert the roster, skipping identities that already exist.
pub fn seed_actors(engine: &TriageEngine, plan: &SeedPlan) -> TriageResult<usize> {
    let store = engine.store();
    let mut wanted = vec![NewActor::new(ADMIN_IDENTITY, "Desk Administrator", Role::Admin)];
    for i in 1..=plan.support {
        wanted.push(NewActor::new(
            support_identity(i),
            format!("IT Support Personnel {i}"),
            Role::Support,
        ));
    }
    for i in 1..=plan.employees {
        wanted.push(NewActor::new(employee_identity(i), format!("Employee {i}"), Role::Employee));
    }

    let mut added = 0;
    for actor in &wanted {
        if store.get_actor_by_identity(&actor.email)?.is_some() {
            continue;
        }
        store.insert_actor(actor)?;
        added += 1;
    }
    log::info!("seed: added {added} actors ({} requested)", wanted.len());
    Ok(added)
}

pub fn seed_desk(engine: &TriageEngine, plan: &SeedPlan) -> TriageResult<SeedReport> {
    let mut report = SeedReport {
        actors_added: seed_actors(engine, plan)?,
        ..SeedReport::default()
    };

    let filers: Vec<String> = if plan.employees == 0 {
        vec![ADMIN_IDENTITY.to_string()]
    } else {
        (1..=plan.employees).map(employee_identity).collect()
    };
    let later = [Status::InProgress, Status::Resolved, Status::Closed];
    let mut rng = SeedRng::new(plan.seed);

    for _ in 0..plan.complaints {
        let filer = rng.pick(&filers);
        let text = rng.pick(SAMPLE_TEXTS);
        let complaint = engine.create_complaint(text, filer)?;
        report.complaints_filed += 1;

        if rng.chance(plan.progress_probability) {
            let status = *rng.pick(&later);
            let mut changes = ComplaintUpdate::default().status(status);
            if status != Status::InProgress {
                changes = changes.response(*rng.pick(RESPONSES));
            }
            engine.update_complaint(complaint.id, ADMIN_IDENTITY, &changes)?;
            report.status_changes += 1;
        }
    }

    log::info!(
        "seed: filed {} complaints, {} moved past Pending",
        report.complaints_filed,
        report.status_changes
    );
    Ok(report)
}
