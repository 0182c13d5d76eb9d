use rigprobe_animation_core::{
    AnimationJob, Clip, EvalError, GraphConfig, PlayableGraph, PlayableId, Skeleton,
    TransformStreamHandle,
};
use rigprobe_api_core::BonePath;

/// A built, playing graph: clip → stages (in order) → output.
#[derive(Debug)]
pub struct Assembly {
    pub graph: PlayableGraph,
    pub handle: TransformStreamHandle,
    pub clip: PlayableId,
    pub stages: Vec<PlayableId>,
}

/// Build the evaluation chain. `stages` receives the bound handle and returns
/// the jobs to insert after the clip, in evaluation order.
pub fn assemble<F>(
    config: GraphConfig,
    skeleton: Skeleton,
    clip: Clip,
    bone: &BonePath,
    stages: F,
) -> Result<Assembly, EvalError>
where
    F: FnOnce(TransformStreamHandle) -> Vec<Box<dyn AnimationJob>>,
{
    let mut graph = PlayableGraph::new(config, skeleton);
    let handle = graph.bind_stream_transform(bone)?;
    let clip = graph.add_clip(clip)?;

    let mut upstream = clip;
    let mut ids = Vec::new();
    for job in stages(handle) {
        let id = graph.add_script(job)?;
        graph.connect(upstream, id, 1.0)?;
        ids.push(id);
        upstream = id;
    }
    graph.set_output(upstream)?;
    graph.play()?;

    Ok(Assembly {
        graph,
        handle,
        clip,
        stages: ids,
    })
}
