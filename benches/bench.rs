// Criterion benchmarks for Nikah Algo

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nikah_algo::core::{cosine_similarity, MatchSide, SimilarityMatcher};
use nikah_algo::models::{ContentType, CulturalContext, PartnerPreferences, ProfileEmbeddings, UserProfile};
use nikah_algo::moderation::IslamicComplianceChecker;

const DIMS: usize = 1536;

fn create_vector(seed: usize) -> Vec<f32> {
    (0..DIMS).map(|i| (((i * 31 + seed * 17) % 97) as f32 / 97.0) - 0.5).collect()
}

fn create_profile(id: usize) -> UserProfile {
    let gender = if id % 2 == 0 { "female" } else { "male" };
    let zone = if id % 3 == 0 { "uk" } else { "europe_west" };
    let status = if id % 5 == 0 { "divorced" } else { "never_married" };
    serde_json::from_value(serde_json::json!({
        "userId": id.to_string(),
        "birthYear": 1990 + (id % 10),
        "gender": gender,
        "locationZone": zone,
        "maritalStatus": status,
        "prayerFrequency": "often",
        "modestyLevel": "always",
        "ethnicity": "pakistani",
        "languages": ["english", "urdu"]
    }))
    .unwrap()
}

fn create_embeddings(id: usize) -> ProfileEmbeddings {
    ProfileEmbeddings {
        profile_id: id.to_string(),
        values: create_vector(id),
        interests: create_vector(id + 1),
        lifestyle: create_vector(id + 2),
        personality: create_vector(id + 3),
        profile_text: create_vector(id + 4),
        model: "bench".to_string(),
        dimensions: DIMS,
        generated_at: Utc::now(),
        fingerprint: id.to_string(),
    }
}

fn bench_cosine_similarity(c: &mut Criterion) {
    let a = create_vector(1);
    let b = create_vector(2);

    c.bench_function("cosine_similarity_1536", |bench| {
        bench.iter(|| cosine_similarity(black_box(&a), black_box(&b)));
    });
}

fn bench_pair_scoring(c: &mut Criterion) {
    let matcher = SimilarityMatcher::with_defaults();
    let prefs = PartnerPreferences::open("bench");
    let (pa, pb) = (create_profile(0), create_profile(1));
    let (ea, eb) = (create_embeddings(0), create_embeddings(1));

    c.bench_function("score_pair", |bench| {
        bench.iter(|| {
            matcher.score(
                black_box(&MatchSide { profile: &pa, preferences: &prefs, embeddings: &ea }),
                black_box(&MatchSide { profile: &pb, preferences: &prefs, embeddings: &eb }),
                2025,
            )
        });
    });
}

fn bench_ranking(c: &mut Criterion) {
    let matcher = SimilarityMatcher::with_defaults();
    let prefs = PartnerPreferences::open("bench");
    let user = create_profile(0);
    let user_embeddings = create_embeddings(0);

    let mut group = c.benchmark_group("ranking");

    for candidate_count in [10, 50, 100, 500].iter() {
        let profiles: Vec<UserProfile> = (1..=*candidate_count).map(create_profile).collect();
        let embeddings: Vec<ProfileEmbeddings> = (1..=*candidate_count).map(create_embeddings).collect();
        let candidates: Vec<MatchSide<'_>> = profiles
            .iter()
            .zip(embeddings.iter())
            .map(|(profile, embeddings)| MatchSide { profile, preferences: &prefs, embeddings })
            .collect();

        group.bench_with_input(BenchmarkId::new("rank", candidate_count), candidate_count, |bench, _| {
            bench.iter(|| {
                matcher.rank(
                    black_box(&MatchSide { profile: &user, preferences: &prefs, embeddings: &user_embeddings }),
                    black_box(&candidates),
                    black_box(20),
                )
            });
        });
    }

    group.finish();
}

fn bench_compliance_check(c: &mut Criterion) {
    let checker = IslamicComplianceChecker::with_defaults().unwrap();
    let context = CulturalContext::default();
    let message = "Assalamu alaikum, I hope you and your family are well. Inshallah I would like \
                   to learn more about your goals for marriage and how you balance prayer with work.";

    c.bench_function("compliance_check", |bench| {
        bench.iter(|| checker.check_compliance(black_box(message), ContentType::Message, &context));
    });
}

criterion_group!(
    benches,
    bench_cosine_similarity,
    bench_pair_scoring,
    bench_ranking,
    bench_compliance_check
);

criterion_main!(benches);
