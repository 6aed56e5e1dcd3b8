use std::marker::PhantomData;
use std::mem;
use std::ops::Range;

use bytemuck::Pod;
use lightbake_gpu::WORKGROUP_SIZE;
use log::debug;

use super::{storage_entry, BindGroupBuilder, Bindable};

/// Compute pipeline of a single kernel entry point.
///
/// Bindings are attached per dispatch, since most of them change between
/// dispatches.
#[derive(Debug)]
pub struct ComputePass<P> {
    label: String,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
    _params: PhantomData<P>,
}

impl<P> ComputePass<P>
where
    P: Pod,
{
    pub fn new(
        device: &wgpu::Device,
        module: &wgpu::ShaderModule,
        label: impl ToString,
        entry_point: &str,
        bindings: u32,
    ) -> Self {
        let label = label.to_string();

        debug!("Initializing pass: {label}:{entry_point}");

        let entries: Vec<_> = (0..bindings).map(storage_entry).collect();

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("lightbake_{label}_layout")),
                entries: &entries,
            });

        let push_constant_ranges = if mem::size_of::<P>() > 0 {
            vec![wgpu::PushConstantRange {
                stages: wgpu::ShaderStages::COMPUTE,
                range: Range {
                    start: 0,
                    end: mem::size_of::<P>() as u32,
                },
            }]
        } else {
            vec![]
        };

        let pipeline_layout_label =
            format!("lightbake_{label}_pipeline_layout");

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&pipeline_layout_label),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &push_constant_ranges,
            });

        let pipeline_label = format!("lightbake_{label}_pipeline");

        let pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&pipeline_label),
                layout: Some(&pipeline_layout),
                module,
                entry_point,
            });

        Self {
            label,
            bind_group_layout,
            pipeline,
            _params: PhantomData,
        }
    }

    /// Records a dispatch of `count` work-items; `items` get attached to
    /// consecutive bindings, starting at zero.
    pub fn run(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        items: &[&dyn Bindable],
        params: P,
        count: usize,
    ) {
        let bind_group = items
            .iter()
            .fold(BindGroupBuilder::new(&self.label), |bg, item| bg.add(*item))
            .build(device, &self.bind_group_layout);

        let label = format!("lightbake_{}_pass", self.label);

        let mut pass =
            encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&label),
                timestamp_writes: None,
            });

        pass.set_pipeline(&self.pipeline);

        if mem::size_of::<P>() > 0 {
            pass.set_push_constants(0, bytemuck::bytes_of(&params));
        }

        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(workgroups(count), 1, 1);
    }
}

pub fn workgroups(count: usize) -> u32 {
    count.div_ceil(WORKGROUP_SIZE as usize) as u32
}
