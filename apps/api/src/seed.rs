use serde_json::{json, Value};
use tracing::{debug, info};

use auth_cell::{CredentialService, RegisterRequest};
use shared_database::{AppState, supabase::eq};

struct DemoAccount {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    phone: &'static str,
    doctor: Option<DemoDoctor>,
}

struct DemoDoctor {
    specialization: &'static str,
    qualification: &'static str,
    experience: i32,
    availability: &'static str,
    consultation_fee: f64,
    rating: f64,
}

const DEMO_ACCOUNTS: &[DemoAccount] = &[
    DemoAccount {
        name: "Dr. Sarah Johnson",
        email: "doctor@healthcare.com",
        password: "doctor123",
        phone: "9876543210",
        doctor: Some(DemoDoctor {
            specialization: "Cardiologist",
            qualification: "MBBS, MD (Cardiology)",
            experience: 10,
            availability: "Mon-Fri: 9AM-5PM",
            consultation_fee: 500.0,
            rating: 4.8,
        }),
    },
    DemoAccount {
        name: "Dr. Michael Chen",
        email: "doctor2@healthcare.com",
        password: "doctor123",
        phone: "9876543211",
        doctor: Some(DemoDoctor {
            specialization: "Neurologist",
            qualification: "MBBS, MD (Neurology)",
            experience: 8,
            availability: "Mon-Sat: 10AM-6PM",
            consultation_fee: 600.0,
            rating: 4.9,
        }),
    },
    DemoAccount {
        name: "John Doe",
        email: "patient@healthcare.com",
        password: "patient123",
        phone: "9876543212",
        doctor: None,
    },
];

/// Register the demo doctors and patient when the store has no users yet.
/// Returns how many accounts were created.
pub async fn seed_demo_data(state: &AppState) -> anyhow::Result<usize> {
    let existing: Vec<Value> = state.db.select("users?select=user_id&limit=1").await?;
    if !existing.is_empty() {
        return Ok(0);
    }

    let credentials = CredentialService::new(state);

    for account in DEMO_ACCOUNTS {
        let request = RegisterRequest {
            name: Some(account.name.to_string()),
            email: Some(account.email.to_string()),
            password: Some(account.password.to_string()),
            role: Some(if account.doctor.is_some() { "doctor" } else { "patient" }.to_string()),
            phone: Some(account.phone.to_string()),
            specialization: account.doctor.as_ref().map(|d| d.specialization.to_string()),
            qualification: account.doctor.as_ref().map(|d| d.qualification.to_string()),
            experience: account.doctor.as_ref().map(|d| d.experience),
            availability: account.doctor.as_ref().map(|d| d.availability.to_string()),
            consultation_fee: account.doctor.as_ref().map(|d| d.consultation_fee),
        };

        let registered = credentials.register(request).await?;
        debug!("Seeded demo account {}", account.email);

        // Ratings are not part of registration
        if let (Some(doctor), Some(doctor_id)) = (&account.doctor, registered.user.doctor_id) {
            let _: Vec<Value> = state.db
                .update(&format!("doctors?doctor_id={}", eq(doctor_id)), json!({ "rating": doctor.rating }))
                .await?;
        }
    }

    info!("Demo logins: doctor@healthcare.com / doctor123, patient@healthcare.com / patient123");
    Ok(DEMO_ACCOUNTS.len())
}
