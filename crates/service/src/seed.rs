use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::info;

use ats_core::{
    Application, ApplicationStatus, Candidate, Position, PositionStatus, PositionType,
};

use crate::{RecordError, Records};

/// Positions with an index up to this value are always active.
const ALWAYS_ACTIVE_POSITIONS: usize = 25;
const POSTING_WINDOW_DAYS: i64 = 60;
const APPLICATION_WINDOW_DAYS: i64 = 30;

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Christopher", "Karen", "Charles", "Helen", "Daniel", "Nancy", "Matthew", "Lisa", "Anthony",
    "Betty", "Mark", "Dorothy", "Donald", "Sandra", "Steven", "Donna", "Paul", "Carol", "Andrew",
    "Ruth", "Joshua", "Sharon", "Kenneth", "Michelle", "Kevin", "Laura", "Brian", "Emily",
    "George", "Kimberly", "Timothy", "Deborah",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzales", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson", "Walker", "Young", "Allen", "King", "Wright",
    "Scott", "Torres", "Nguyen", "Hill", "Flores", "Green", "Adams", "Nelson", "Baker", "Hall",
    "Rivera", "Campbell", "Mitchell", "Carter", "Roberts",
];

const EMAIL_DOMAINS: &[&str] = &["gmail", "yahoo", "outlook", "company"];

const COMPANIES: &[&str] = &[
    "TechCorp Inc.", "InnovateLabs", "DesignStudio", "StartupX", "CloudTech Solutions",
    "DataDriven Analytics", "NextGen Software", "Global Dynamics", "FutureTech Systems",
    "Digital Horizons", "Quantum Computing Co.", "AI Ventures", "CyberSec Solutions",
    "Mobile First Labs", "WebScale Technologies", "Enterprise Solutions Inc.", "DevOps Masters",
    "Cloud Nine Technologies", "Blockchain Innovations", "IoT Solutions Ltd.",
];

const LOCATIONS: &[&str] = &[
    "San Francisco, CA", "New York, NY", "Seattle, WA", "Austin, TX", "Boston, MA",
    "Los Angeles, CA", "Chicago, IL", "Denver, CO", "Portland, OR", "Atlanta, GA", "Miami, FL",
    "Dallas, TX", "Phoenix, AZ", "Philadelphia, PA", "San Diego, CA", "Remote",
    "Hybrid - Bay Area", "Hybrid - NYC", "Remote (US)",
];

const JOB_TITLES: &[&str] = &[
    "Senior Software Engineer", "Frontend Developer", "Backend Developer", "Full Stack Developer",
    "DevOps Engineer", "Data Scientist", "Machine Learning Engineer", "Product Manager",
    "UX Designer", "UI Designer", "QA Engineer", "Security Engineer", "Cloud Architect",
    "Mobile Developer", "Data Analyst", "Technical Lead", "Engineering Manager",
    "Product Designer", "Research Scientist", "Solutions Architect",
];

const DEPARTMENTS: &[&str] = &[
    "Engineering", "Product", "Design", "Data Science", "DevOps", "Security", "Research",
    "Platform", "Infrastructure", "Mobile", "AI/ML", "Analytics",
];

const SKILLS: &[&str] = &[
    "JavaScript", "TypeScript", "React", "Vue.js", "Angular", "Node.js", "Python", "Java", "C++",
    "C#", "Go", "Rust", "PHP", "Ruby", "Swift", "Kotlin", "Flutter", "React Native", "Docker",
    "Kubernetes", "AWS", "Azure", "GCP", "Jenkins", "GitLab CI", "Terraform", "Ansible",
    "MongoDB", "PostgreSQL", "MySQL", "Redis", "Elasticsearch", "GraphQL", "REST APIs",
    "Microservices", "Machine Learning", "Deep Learning", "TensorFlow", "PyTorch", "Git", "Agile",
    "Scrum", "Figma", "Sketch", "Jest", "Cypress",
];

/// Size and reproducibility of the generated dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    pub positions: usize,
    pub candidates: usize,
    pub rng_seed: Option<u64>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            positions: 30,
            candidates: 1000,
            rng_seed: None,
        }
    }
}

/// Records produced by [`generate`]. Every application appears both in
/// `applications` and inside exactly one candidate.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub positions: Vec<Position>,
    pub applications: Vec<Application>,
    pub candidates: Vec<Candidate>,
}

impl Dataset {
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary::from_records(&self.positions, &self.applications, self.candidates.len())
    }
}

/// Counts describing the contents of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub positions: usize,
    pub active_positions: usize,
    pub candidates: usize,
    pub applications: usize,
    pub applications_by_status: BTreeMap<ApplicationStatus, usize>,
}

impl DatasetSummary {
    pub fn from_records(
        positions: &[Position],
        applications: &[Application],
        candidates: usize,
    ) -> Self {
        let mut applications_by_status: BTreeMap<_, _> = ApplicationStatus::ALL
            .into_iter()
            .map(|status| (status, 0))
            .collect();
        for application in applications {
            *applications_by_status.entry(application.status).or_insert(0) += 1;
        }

        Self {
            positions: positions.len(),
            active_positions: positions
                .iter()
                .filter(|position| position.status == PositionStatus::Active)
                .count(),
            candidates,
            applications: applications.len(),
            applications_by_status,
        }
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        self.applications_by_status
            .get(&status)
            .copied()
            .unwrap_or_default()
    }
}

/// Builds a realistic dataset relative to `now`.
pub fn generate(options: &SeedOptions, now: DateTime<Utc>) -> Dataset {
    let mut rng = match options.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let positions: Vec<Position> = (1..=options.positions)
        .map(|index| generate_position(&mut rng, index, now))
        .collect();
    let active: Vec<&Position> = positions
        .iter()
        .filter(|position| position.status == PositionStatus::Active)
        .collect();

    let mut applications = Vec::new();
    let mut candidates = Vec::with_capacity(options.candidates);
    let mut taken_emails = HashSet::new();

    if !active.is_empty() {
        for index in 1..=options.candidates {
            let candidate = generate_candidate(&mut rng, index, &active, &mut taken_emails, now);
            applications.extend(candidate.applications.iter().cloned());
            candidates.push(candidate);
        }
    }

    Dataset {
        positions,
        applications,
        candidates,
    }
}

fn pick<'a>(rng: &mut StdRng, pool: &[&'a str]) -> &'a str {
    pool[rng.gen_range(0..pool.len())]
}

fn pick_many(rng: &mut StdRng, pool: &[&str], min: usize, max: usize) -> Vec<String> {
    let amount = rng.gen_range(min..=max);
    pool.choose_multiple(rng, amount)
        .map(|item| item.to_string())
        .collect()
}

fn recent(rng: &mut StdRng, now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    let window = Duration::days(window_days).num_seconds();
    now - Duration::seconds(rng.gen_range(0..=window))
}

fn generate_position(rng: &mut StdRng, index: usize, now: DateTime<Utc>) -> Position {
    let title = pick(rng, JOB_TITLES);
    let company = pick(rng, COMPANIES);
    let department = pick(rng, DEPARTMENTS);
    let position_type = PositionType::ALL[rng.gen_range(0..PositionType::ALL.len())];
    let status = if index <= ALWAYS_ACTIVE_POSITIONS {
        PositionStatus::Active
    } else {
        PositionStatus::ALL[rng.gen_range(0..PositionStatus::ALL.len())]
    };

    let description = match rng.gen_range(0..3u8) {
        0 => format!(
            "Join our {department} team at {company} as a {title}. We're looking for someone \
             passionate about technology and innovation who can contribute to our growing platform."
        ),
        1 => format!(
            "{company} is seeking a talented {title} to join our dynamic team. You'll work on \
             cutting-edge projects and collaborate with industry experts."
        ),
        _ => format!(
            "We are looking for an experienced {title} to help drive our mission at {company}. \
             This role offers excellent growth opportunities and challenging projects."
        ),
    };

    Position {
        id: format!("pos_{index}"),
        title: title.to_string(),
        company: company.to_string(),
        location: pick(rng, LOCATIONS).to_string(),
        description,
        requirements: pick_many(rng, SKILLS, 3, 7)
            .into_iter()
            .map(|skill| format!("{skill} proficiency"))
            .collect(),
        position_type,
        department: department.to_string(),
        posted_date: recent(rng, now, POSTING_WINDOW_DAYS),
        status,
    }
}

fn generate_candidate(
    rng: &mut StdRng,
    index: usize,
    active: &[&Position],
    taken_emails: &mut HashSet<String>,
    now: DateTime<Utc>,
) -> Candidate {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    let name = format!("{first} {last}");
    let domain = pick(rng, EMAIL_DOMAINS);

    let local = format!("{}.{}", first.to_lowercase(), last.to_lowercase());
    let mut email = format!("{local}@{domain}tech.com");
    if taken_emails.contains(&email) {
        email = format!("{local}{index}@{domain}tech.com");
    }
    taken_emails.insert(email.clone());

    let phone = format!(
        "+1-{}-{}-{}",
        rng.gen_range(100..1000u32),
        rng.gen_range(100..1000u32),
        rng.gen_range(1000..10000u32)
    );

    let wanted = rng.gen_range(1..=3usize).min(active.len());
    let targets: Vec<&Position> = active.choose_multiple(rng, wanted).copied().collect();

    let applications = targets
        .into_iter()
        .enumerate()
        .map(|(offset, position)| {
            generate_application(rng, index, offset + 1, position, &name, &email, &phone, now)
        })
        .collect();

    Candidate {
        id: format!("cand_{index}"),
        name,
        email,
        phone,
        applications,
    }
}

#[allow(clippy::too_many_arguments)]
fn generate_application(
    rng: &mut StdRng,
    candidate_index: usize,
    ordinal: usize,
    position: &Position,
    name: &str,
    email: &str,
    phone: &str,
    now: DateTime<Utc>,
) -> Application {
    let experience: u32 = rng.gen_range(1..=15);
    let skills = pick_many(rng, SKILLS, 3, 8);
    let lead = skills[..2].join(" and ");
    let title = &position.title;
    let company = &position.company;

    let cover_letter = match rng.gen_range(0..3u8) {
        0 => format!(
            "I am excited to apply for the {title} position at {company}. With {experience} years \
             of experience in {lead}, I believe I would be a valuable addition to your team."
        ),
        1 => format!(
            "Having followed {company}, I am impressed by your innovative approach. My background \
             in {lead} aligns perfectly with the {title} role requirements."
        ),
        _ => format!(
            "I am writing to express my interest in the {title} position. My {experience} years of \
             experience in software development make me an ideal candidate for this role."
        ),
    };
    let resume = match rng.gen_range(0..3u8) {
        0 => format!(
            "Experienced {title} with {experience} years in software development. Proficient in {}. \
             Led successful projects and mentored developers.",
            skills[..4.min(skills.len())].join(", ")
        ),
        1 => format!(
            "{experience}+ years of experience in technology. Specializes in {}. Track record of \
             delivering scalable solutions.",
            skills[..3].join(", ")
        ),
        _ => format!(
            "Results-driven professional with {experience} years of experience. Expert in {}. \
             Passionate about emerging technologies.",
            skills[..4.min(skills.len())].join(", ")
        ),
    };

    Application {
        id: format!("app_{candidate_index}_{ordinal}"),
        position_id: position.id.clone(),
        candidate_name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        resume,
        cover_letter,
        experience,
        skills,
        application_date: recent(rng, now, APPLICATION_WINDOW_DAYS),
        status: weighted_status(rng.gen::<f64>()),
    }
}

/// Maps a uniform sample in `[0, 1)` onto the pipeline's typical distribution.
fn weighted_status(sample: f64) -> ApplicationStatus {
    match sample {
        s if s < 0.40 => ApplicationStatus::Pending,
        s if s < 0.65 => ApplicationStatus::Reviewed,
        s if s < 0.80 => ApplicationStatus::Shortlisted,
        s if s < 0.95 => ApplicationStatus::Rejected,
        _ => ApplicationStatus::Hired,
    }
}

impl Records {
    /// Seeds the store when it holds no positions yet.
    ///
    /// Returns the summary of what was written, or `None` when data already existed.
    pub async fn initialize(
        &self,
        options: &SeedOptions,
    ) -> Result<Option<DatasetSummary>, RecordError> {
        let database = self.database();
        let existing = database.positions().count().await?;
        if existing > 0 {
            info!(stage = "seed", positions = existing, "store already has data, skipping seeding");
            return Ok(None);
        }

        let dataset = generate(options, self.shared.now());
        database.positions().put_many(&dataset.positions).await?;
        database.applications().put_many(&dataset.applications).await?;
        database.candidates().put_many(&dataset.candidates).await?;

        counter!("seed_records_total", "collection" => "positions")
            .increment(dataset.positions.len() as u64);
        counter!("seed_records_total", "collection" => "applications")
            .increment(dataset.applications.len() as u64);
        counter!("seed_records_total", "collection" => "candidates")
            .increment(dataset.candidates.len() as u64);

        let summary = dataset.summary();
        info!(
            stage = "seed",
            positions = summary.positions,
            active_positions = summary.active_positions,
            candidates = summary.candidates,
            applications = summary.applications,
            "store seeded"
        );
        Ok(Some(summary))
    }

    /// Clears all three collections and seeds them again.
    pub async fn reset(
        &self,
        options: &SeedOptions,
    ) -> Result<Option<DatasetSummary>, RecordError> {
        let database = self.database();
        let positions = database.positions().clear().await?;
        let applications = database.applications().clear().await?;
        let candidates = database.candidates().clear().await?;
        info!(stage = "seed", positions, applications, candidates, "store cleared");

        self.initialize(options).await
    }

    /// Summarizes the current contents of the store through the read operations.
    pub async fn summary(&self) -> Result<DatasetSummary, RecordError> {
        let positions = self.positions().list().await?;
        let applications = self.applications().list_all().await?;
        let candidates = self.candidates().list().await?;
        Ok(DatasetSummary::from_records(
            &positions,
            &applications,
            candidates.len(),
        ))
    }
}
