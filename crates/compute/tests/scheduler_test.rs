//! Scheduler behaviour against in-memory collaborators: preemption,
//! latest-wins replacement, cancellation, delivery order, regeneration
//! and pruning.

mod common;

use std::sync::Arc;
use std::time::Duration;

use slidesmith_compute::{CategoryKind, OutputSink, PriorityTask, Scheduler};

use common::{
    categories, collaborators, gate, palettes, recording_sink, slow_generators, units, units_with, wait_until,
    FakeCompiler, FakeRenderer, TIMEOUT,
};

#[test]
fn priority_unit_preempts_the_walk() {
    let dir = tempfile::tempdir().unwrap();
    let (gate, handle) = gate("u0_org");
    let compiler = Arc::new(FakeCompiler::gated(gate));
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    scheduler.start(units(3, 0, dir.path())).unwrap();

    // Walker is busy with unit 0 when unit 2 is requested.
    handle.wait_entered();
    let (sink, seen) = recording_sink();
    scheduler.set_priority_task(PriorityTask::load(2, 0, Arc::new(sink))).unwrap();
    handle.open();

    assert!(scheduler.wait_finished(TIMEOUT).unwrap());
    assert_eq!(compiler.baselines(), vec!["u0_org", "u2_org", "u1_org"]);
    assert_eq!(scheduler.compiled_units(), vec![0, 1, 2]);

    let delivered = seen.lock().unwrap();
    assert_eq!(delivered.len(), 4);
    assert!(delivered.iter().all(|v| v.unit == 2 && v.page == 0));
}

#[test]
fn latest_task_replaces_pending_one() {
    let dir = tempfile::tempdir().unwrap();
    let (gate, handle) = gate("u0_org");
    let compiler = Arc::new(FakeCompiler::gated(gate));
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    scheduler.start(units(3, 0, dir.path())).unwrap();
    handle.wait_entered();

    let (first, first_seen) = recording_sink();
    let (second, second_seen) = recording_sink();
    scheduler.set_priority_task(PriorityTask::load(1, 0, Arc::new(first))).unwrap();
    scheduler.set_priority_task(PriorityTask::load(2, 0, Arc::new(second))).unwrap();
    assert_eq!(scheduler.pending_task().map(|t| t.unit), Some(2));
    handle.open();

    assert!(scheduler.wait_finished(TIMEOUT).unwrap());
    assert!(first_seen.lock().unwrap().is_empty());
    assert_eq!(second_seen.lock().unwrap().len(), 4);
    assert_eq!(compiler.baselines(), vec!["u0_org", "u2_org", "u1_org"]);
}

#[test]
fn cancelled_sink_receives_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (gate, handle) = gate("u0_org");
    let compiler = Arc::new(FakeCompiler::gated(gate));
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    scheduler.start(units(2, 0, dir.path())).unwrap();
    handle.wait_entered();

    let (sink, seen) = recording_sink();
    let sink = Arc::new(sink);
    scheduler.set_priority_task(PriorityTask::load(1, 0, Arc::clone(&sink))).unwrap();
    sink.cancel();
    handle.open();

    assert!(scheduler.wait_finished(TIMEOUT).unwrap());
    assert!(seen.lock().unwrap().is_empty());
    // Pages of a cancelled task are not even rendered.
    assert_eq!(renderer.renders(), 0);
    // The unit itself is still compiled.
    assert!(scheduler.is_compiled(1));
}

#[test]
fn categories_are_delivered_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = Arc::new(FakeCompiler::default());
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));

    let (sink, seen) = recording_sink();
    scheduler.set_priority_task(PriorityTask::load(0, 0, Arc::new(sink))).unwrap();
    scheduler.start(units(1, 2, dir.path())).unwrap();
    assert!(scheduler.wait_finished(TIMEOUT).unwrap());

    assert_eq!(
        categories(&seen),
        vec![
            (CategoryKind::Local, 0),
            (CategoryKind::Local, 1),
            (CategoryKind::Background, 0),
            (CategoryKind::Background, 1),
            (CategoryKind::Global, 0),
            (CategoryKind::Global, 1),
        ]
    );
    let background = scheduler.unit(0).unwrap().background_improvements().all_variants();
    assert!(background[1].code().bg_img_path.ends_with("u0_bg1.png"));
}

#[test]
fn replay_matches_first_delivery() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = Arc::new(FakeCompiler::default());
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    scheduler.start(units(2, 1, dir.path())).unwrap();
    assert!(scheduler.wait_finished(TIMEOUT).unwrap());
    let compiled = compiler.jobs().len();

    let (sink, seen) = recording_sink();
    scheduler.set_priority_task(PriorityTask::load(1, 0, Arc::new(sink))).unwrap();
    assert!(wait_until(|| seen.lock().unwrap().len() == 5));
    assert_eq!(
        categories(&seen),
        vec![
            (CategoryKind::Local, 0),
            (CategoryKind::Local, 1),
            (CategoryKind::Background, 0),
            (CategoryKind::Global, 0),
            (CategoryKind::Global, 1),
        ]
    );
    assert_eq!(compiler.jobs().len(), compiled);
}

#[test]
fn regeneration_rebuilds_only_backgrounds() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = Arc::new(FakeCompiler::default());
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    scheduler.start(units(2, 2, dir.path())).unwrap();
    assert!(scheduler.wait_finished(TIMEOUT).unwrap());

    let unit = scheduler.unit(0).unwrap();
    let local = unit.local_improvements().all_variants();
    let global = unit.global_improvements().all_variants();
    let background = unit.background_improvements().all_variants();
    unit.background_improvements().select_alternative(2).unwrap();
    unit.global_improvements().select_alternative(1).unwrap();

    let (sink, seen) = recording_sink();
    scheduler
        .set_priority_task(PriorityTask::regenerate_backgrounds(0, 0, Arc::new(sink)))
        .unwrap();
    assert!(wait_until(|| scheduler.pending_task().is_none() && seen.lock().unwrap().len() == 2));

    assert_eq!(
        categories(&seen),
        vec![(CategoryKind::Background, 0), (CategoryKind::Background, 1)]
    );
    let rebuilt = unit.background_improvements().all_variants();
    assert_eq!(rebuilt.len(), 2);
    assert!(rebuilt.iter().zip(&background).all(|(a, b)| !Arc::ptr_eq(a, b)));
    assert_eq!(rebuilt[1].name(), "u0_b1");
    assert!(unit.local_improvements().all_variants().iter().zip(&local).all(|(a, b)| Arc::ptr_eq(a, b)));
    assert!(unit.global_improvements().all_variants().iter().zip(&global).all(|(a, b)| Arc::ptr_eq(a, b)));

    assert_eq!(unit.background_improvements().current_selection(), 0);
    assert_eq!(unit.global_improvements().current_selection(), 1);
    assert!(scheduler.is_compiled(0));
}

#[test]
fn failed_variants_are_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = Arc::new(FakeCompiler::failing_on("tabular"));
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    scheduler.start(units(2, 0, dir.path())).unwrap();
    assert!(scheduler.wait_finished(TIMEOUT).unwrap());

    for unit in scheduler.units() {
        let names: Vec<String> = unit
            .local_improvements()
            .all_variants()
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(names, vec![format!("u{}_l0", unit.index())]);
        assert_eq!(unit.global_improvements().all_variants().len(), 2);
    }

    let (sink, seen) = recording_sink();
    scheduler.set_priority_task(PriorityTask::load(0, 0, Arc::new(sink))).unwrap();
    assert!(wait_until(|| seen.lock().unwrap().len() == 3));
    assert_eq!(categories(&seen)[0], (CategoryKind::Local, 0));
}

#[test]
fn broken_baseline_leaves_unit_untracked() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = Arc::new(FakeCompiler::failing_on("itemize"));
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    scheduler.start(units(2, 0, dir.path())).unwrap();

    assert!(scheduler.wait_finished(TIMEOUT).unwrap());
    assert!(scheduler.compiled_units().is_empty());

    // Asking for it again retries nothing and delivers nothing.
    let jobs = compiler.jobs().len();
    let (sink, seen) = recording_sink();
    scheduler.set_priority_task(PriorityTask::load(1, 0, Arc::new(sink))).unwrap();
    assert!(wait_until(|| scheduler.pending_task().is_none()));
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(compiler.jobs().len(), jobs);
}

#[test]
fn stopped_scheduler_leaves_tasks_pending() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = Arc::new(FakeCompiler::default());
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    scheduler.start(units(2, 0, dir.path())).unwrap();
    assert!(scheduler.wait_finished(TIMEOUT).unwrap());
    scheduler.stop();

    scheduler
        .set_priority_task(PriorityTask::regenerate_backgrounds(1, 0, Arc::new(OutputSink::discard())))
        .unwrap();
    assert_eq!(scheduler.pending_task().map(|t| t.unit), Some(1));
}

#[test]
fn task_during_last_unit_is_serviced_before_finishing() {
    let dir = tempfile::tempdir().unwrap();
    let (gate, handle) = gate("u2_org");
    let compiler = Arc::new(FakeCompiler::gated(gate));
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    scheduler.start(units(3, 1, dir.path())).unwrap();
    handle.wait_entered();

    let (sink, seen) = recording_sink();
    scheduler
        .set_priority_task(PriorityTask::regenerate_backgrounds(0, 0, Arc::new(sink)))
        .unwrap();
    assert!(!scheduler.is_finished());
    assert_eq!(scheduler.pending_task().map(|t| t.unit), Some(0));
    handle.open();

    assert!(scheduler.wait_finished(TIMEOUT).unwrap());
    // Finishing waits for the mailbox to be drained.
    assert!(scheduler.pending_task().is_none());
    assert_eq!(categories(&seen), vec![(CategoryKind::Background, 0)]);
    assert_eq!(scheduler.compiled_units(), vec![0, 1, 2]);
}

#[test]
fn regenerations_after_finish_are_serviced_one_at_a_time() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = Arc::new(FakeCompiler::default());
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    let generators = slow_generators(2, Duration::from_millis(100));
    scheduler.start(units_with(1, generators, dir.path())).unwrap();
    assert!(scheduler.wait_finished(TIMEOUT).unwrap());

    let (first, first_rx) = OutputSink::channels();
    let (second, second_rx) = OutputSink::channels();
    scheduler
        .set_priority_task(PriorityTask::regenerate_backgrounds(0, 0, Arc::new(first)))
        .unwrap();
    std::thread::sleep(Duration::from_millis(50));
    scheduler
        .set_priority_task(PriorityTask::regenerate_backgrounds(0, 0, Arc::new(second)))
        .unwrap();

    second_rx.done.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(second_rx.background.try_iter().count(), 2);
    assert!(wait_until(|| scheduler.pending_task().is_none()));

    // Overlapping rebuilds would have interleaved their variants.
    let unit = scheduler.unit(0).unwrap();
    let names: Vec<String> = unit
        .background_improvements()
        .all_variants()
        .iter()
        .map(|v| v.name().to_string())
        .collect();
    assert_eq!(names, vec!["u0_b0", "u0_b1"]);
    assert!(first_rx.background.try_iter().count() <= 2);
    assert!(scheduler.is_compiled(0));
}

#[test]
fn palette_choice_survives_a_pruned_palette_variant() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = Arc::new(FakeCompiler::failing_job("u0_g0"));
    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = Scheduler::new(collaborators(&compiler, &renderer));
    scheduler.start(units(2, 0, dir.path())).unwrap();
    assert!(scheduler.wait_finished(TIMEOUT).unwrap());

    let first = scheduler.unit(0).unwrap();
    let second = scheduler.unit(1).unwrap();
    assert_eq!(first.global_improvements().all_variants().len(), 1);
    assert_eq!(second.global_improvements().all_variants().len(), 2);

    let palettes = palettes();
    second.global_improvements().select_alternative(1).unwrap();
    assert_eq!(first.improved_code().global_color_defs, palettes.palettes()[0]);
    assert_eq!(second.improved_code().global_color_defs, palettes.palettes()[0]);

    first.global_improvements().select_alternative(2).unwrap();
    assert_eq!(first.improved_code().global_color_defs, palettes.palettes()[1]);
    assert_eq!(second.improved_code().global_color_defs, palettes.palettes()[1]);
    assert!(first.global_improvements().select_alternative(3).is_err());
}
