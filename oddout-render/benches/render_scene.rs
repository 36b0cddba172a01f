use criterion::{Criterion, black_box, criterion_group, criterion_main};
use oddout_core::{ItemId, Layout, Scene};
use oddout_render::{SkiaRenderer, Stimulus};
use tiny_skia::{Color, Pixmap};

fn stimuli(size: u32) -> [Stimulus; 3] {
    [40u8, 120, 200].map(|shade| {
        let mut pm = Pixmap::new(size, size).unwrap();
        pm.fill(Color::from_rgba8(shade, shade, shade, 255));
        Stimulus::new(ItemId(shade as usize), pm)
    })
}

pub fn bench_trial_scene(c: &mut Criterion) {
    let layout = Layout::default();
    let mut renderer = SkiaRenderer::new(layout.width, layout.height, None).unwrap();
    let stimuli = stimuli(180);

    let mut g = c.benchmark_group("render_scene");
    g.sample_size(60);
    g.bench_function("trial", |b| {
        b.iter(|| {
            renderer
                .render_scene(black_box(&Scene::Trial {
                    question: "Which is the odd one out?",
                    layout: &layout,
                    stimuli: &stimuli,
                }))
                .unwrap();
        })
    });
    g.bench_function("blank", |b| {
        b.iter(|| renderer.render_scene(black_box(&Scene::Blank)).unwrap())
    });
    g.finish();
}

criterion_group!(benches, bench_trial_scene);
criterion_main!(benches);
