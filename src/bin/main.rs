use fpa_copilot::{agent::Copilot, composer::EXAMPLE_QUESTIONS, data};
use std::sync::Arc;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let data_dir =
        std::env::var("FPA_DATA_DIR").unwrap_or_else(|_| "fixtures".to_string());

    info!("FP&A Copilot");
    info!("Data directory: {}", data_dir);

    let snapshot = Arc::new(data::load_dir(&data_dir)?);
    let copilot = Copilot::new(snapshot);

    let question: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let questions: Vec<&str> = if question.trim().is_empty() {
        EXAMPLE_QUESTIONS.to_vec()
    } else {
        vec![question.as_str()]
    };

    for question in questions {
        let record = copilot.respond(question);

        println!("\n=== {} ===", question);
        println!("{}", record.answer.text);

        if !record.answer.series.is_empty() {
            println!("Series:");
            for point in &record.answer.series {
                match point.value {
                    Some(v) => println!("  {}: {:.2}", point.label, v),
                    None => println!("  {}: (undefined)", point.label),
                }
            }
        }
        for diagnostic in &record.answer.diagnostics {
            println!("Note: {}", diagnostic);
        }
        println!("Audit ID: {}", record.audit_id);
    }

    Ok(())
}
