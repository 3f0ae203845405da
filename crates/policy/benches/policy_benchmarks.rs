use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use ccvms_auth::{Role, Subject};
use ccvms_core::{MinistryId, UserId, VolunteerId};
use ccvms_policy::{Action, Resource, ScopeDescriptor, decide, filter_scoped, resolve_scope};
use ccvms_volunteers::VolunteerProfile;

fn profiles(count: usize, ministries: &[MinistryId]) -> Vec<VolunteerProfile> {
    (0..count)
        .map(|i| {
            VolunteerProfile::new(VolunteerId::new(), UserId::new())
                .with_ministries([ministries[i % ministries.len()]])
        })
        .collect()
}

fn bench_decide(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");

    let ministry = MinistryId::new();
    let priest = Subject::new(UserId::new(), Role::Priest).with_ministry(ministry);
    let admin = Subject::new(UserId::new(), Role::Administrator);
    let target = Subject::new(UserId::new(), Role::Volunteer);
    let profile = VolunteerProfile::new(VolunteerId::new(), target.id).with_ministries([ministry]);

    group.bench_function("priest_approve_in_scope", |b| {
        b.iter(|| decide(black_box(&priest), Action::ApproveVolunteer, &Resource::Volunteer(&profile)));
    });

    group.bench_function("priest_promote_coordinator", |b| {
        let resource = Resource::RoleChange {
            target: &target,
            profile: Some(&profile),
            new_role: Role::Coordinator,
        };
        b.iter(|| decide(black_box(&priest), Action::AssignRole, &resource));
    });

    group.bench_function("admin_suspend", |b| {
        b.iter(|| decide(black_box(&admin), Action::SuspendUser, &Resource::User(&target)));
    });

    group.finish();
}

fn bench_apply_scope(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_scope");
    let ministries: Vec<MinistryId> = (0..8).map(|_| MinistryId::new()).collect();
    let priest = Subject::new(UserId::new(), Role::Priest).with_ministry(ministries[0]);

    for size in [100usize, 1_000, 10_000] {
        let items = profiles(size, &ministries);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("ministry", size), &items, |b, items| {
            let scope = resolve_scope(&priest);
            b.iter(|| filter_scoped(black_box(&scope), items.iter().cloned()));
        });

        group.bench_with_input(BenchmarkId::new("empty", size), &items, |b, items| {
            b.iter(|| filter_scoped(black_box(&ScopeDescriptor::Empty), items.iter().cloned()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decide, bench_apply_scope);
criterion_main!(benches);
