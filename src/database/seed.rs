use tracing::info;

use super::models::NewDoctor;
use super::storage::{Storage, StorageError};

/// Doctors created on first boot against an empty store
pub fn default_doctors() -> Vec<NewDoctor> {
    vec![
        NewDoctor {
            name: "Dr. Sarah Johnson".to_string(),
            specialization: "Cardiology".to_string(),
            bio: "Expert cardiologist with 15 years experience.".to_string(),
            image_url: "https://images.unsplash.com/photo-1559839734-2b71ea197ec2?auto=format&fit=crop&q=80".to_string(),
            availability: "Mon-Fri 09:00-17:00".to_string(),
            experience: 15,
            rating: "4.9".to_string(),
        },
        NewDoctor {
            name: "Dr. Michael Chen".to_string(),
            specialization: "Pediatrics".to_string(),
            bio: "Friendly pediatrician loved by kids.".to_string(),
            image_url: "https://images.unsplash.com/photo-1612349317150-e413f6a5b16d?auto=format&fit=crop&q=80".to_string(),
            availability: "Mon-Wed, Fri 10:00-16:00".to_string(),
            experience: 10,
            rating: "4.8".to_string(),
        },
        NewDoctor {
            name: "Dr. Emily Wilson".to_string(),
            specialization: "Neurology".to_string(),
            bio: "Specializing in neurological disorders.".to_string(),
            image_url: "https://images.unsplash.com/photo-1594824476967-48c8b964273f?auto=format&fit=crop&q=80".to_string(),
            availability: "Tue-Thu 08:00-14:00".to_string(),
            experience: 12,
            rating: "4.9".to_string(),
        },
    ]
}

/// Insert the default doctors when the doctors table is empty.
/// Returns how many were created.
pub async fn seed_doctors(storage: &dyn Storage) -> Result<usize, StorageError> {
    if !storage.get_doctors().await?.is_empty() {
        return Ok(0);
    }

    let doctors = default_doctors();
    let count = doctors.len();
    for doctor in doctors {
        storage.create_doctor(doctor).await?;
    }

    info!("Seeded {} doctors", count);
    Ok(count)
}
