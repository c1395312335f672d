//! Utility to set the subject profile in the database
//!
//! Usage: set_patient_info <name> [dob]

use std::path::PathBuf;

fn get_database_path() -> PathBuf {
    std::env::var("HMT_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            std::fs::create_dir_all(&path).ok();
            path.push("hmt.db");
            path
        })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <name> [dob YYYY-MM-DD]", args[0]);
        std::process::exit(1);
    }
    let name = &args[1];
    let dob = args.get(2).map(String::as_str);

    let db_path = get_database_path();
    println!("Database path: {}", db_path.display());

    let database = hmt::db::Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        hmt::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    // Set patient info
    database.with_conn(|conn| {
        let patient = hmt::models::PatientInfo::set(conn, name, dob)?;
        println!("Patient info set:");
        println!("  Name: {}", patient.name);
        println!("  DOB: {}", patient.dob.as_deref().unwrap_or("-"));
        println!("  Updated: {}", patient.updated_at);
        Ok(())
    })?;

    Ok(())
}
