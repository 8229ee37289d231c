//! Document Approval Workflow
//!
//! This example demonstrates a Petri-net approval workflow with parallel
//! reviews, guards and listeners.
//!
//! Key concepts:
//! - Fork/join: editorial and legal review run in parallel
//! - Guards enforce business rules (word count)
//! - The audit trail logs every place left and entered through `tracing`
//! - The history listener records every fired transition
//!
//! Run with: RUST_LOG=workflow=info cargo run --example document_workflow

use placemark::builder::{DefinitionBuilder, WorkflowBuilder};
use placemark::event::EventBus;
use placemark::impl_subject;
use placemark::listeners::{AuditTrailListener, HistoryListener};
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// Document entity
struct Document {
    id: u64,
    word_count: usize,
    marking: Option<Value>,
}

impl_subject!(Document as "Document" { marking });

// Pure guards - validation logic
fn can_submit_for_review(doc: &Document) -> bool {
    doc.word_count >= 100
}

fn can_publish(doc: &Document) -> bool {
    doc.word_count <= 5000
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("workflow=info")))
        .init();

    println!("=== Document Approval Workflow ===\n");

    let definition = DefinitionBuilder::new()
        .places([
            "draft",
            "editorial_review",
            "legal_review",
            "editorial_ok",
            "legal_ok",
            "published",
        ])
        .transition("submit", ["draft"], ["editorial_review", "legal_review"])
        .transition("approve_editorial", ["editorial_review"], ["editorial_ok"])
        .transition("approve_legal", ["legal_review"], ["legal_ok"])
        .transition("publish", ["editorial_ok", "legal_ok"], ["published"])
        .initial_place("draft")
        .build()
        .unwrap();

    let bus = Arc::new(EventBus::new());
    AuditTrailListener::new().subscribe(&bus, "document");
    let history = Arc::new(HistoryListener::new());
    Arc::clone(&history).subscribe(&bus, "document");

    let workflow = WorkflowBuilder::new("document", definition)
        .dispatcher(bus)
        .when_subject("submit", can_submit_for_review)
        .when_subject("publish", can_publish)
        .build();

    println!("Created document workflow");
    println!("Places: draft -> (editorial_review | legal_review) -> published\n");

    let mut doc = Document {
        id: 123,
        word_count: 250,
        marking: None,
    };

    println!("Processing document {}:", doc.id);
    println!("  Word count: {}\n", doc.word_count);

    for step in ["submit", "approve_legal", "publish", "approve_editorial", "publish"] {
        let enabled: Vec<_> = workflow
            .enabled_transitions(&doc)
            .unwrap()
            .map(|t| t.unwrap().name().to_string())
            .collect();
        println!("Enabled: {enabled:?}");

        match workflow.apply(&mut doc, step) {
            Ok(marking) => {
                let places: Vec<_> = marking.places().collect();
                println!("  ✓ {step} -> {places:?}\n");
            }
            Err(e) => println!("  ✗ {e}\n"),
        }
    }

    println!("History: {:?}", history.history().transition_names());

    println!("\nKey Takeaways:");
    println!("- A marking can hold several places at once");
    println!("- A join fires only when every input place is marked");
    println!("- Guards veto transitions without side effects");
    println!("- Listeners observe every step synchronously");

    println!("\n=== Example Complete ===");
}
