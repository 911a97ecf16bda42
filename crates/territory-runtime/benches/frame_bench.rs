use criterion::{black_box, criterion_group, criterion_main, Criterion};
use territory_core::{BaseController, Interaction, MatchState, ScoreEngine, Team};
use territory_runtime::Reconciler;

fn all_held() -> MatchState {
    let ctl = BaseController::default();
    let mut state = MatchState::default();
    for (base, team) in state.bases.values_mut().zip(Team::ALL) {
        if let Some(next) = ctl.apply(base, Interaction::Start, team, 0) {
            *base = next;
        }
    }
    state
}

fn bench_frame(c: &mut Criterion) {
    let mut r = Reconciler::new(all_held(), ScoreEngine::default());
    let mut now = 0;
    c.bench_function("frame four held bases", |b| {
        b.iter(|| {
            now += 16;
            black_box(r.frame(black_box(now)).bases.len())
        })
    });
}

criterion_group!(benches, bench_frame);
criterion_main!(benches);
