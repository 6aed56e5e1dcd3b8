/// Object that can be attached to a pipeline, e.g. a buffer.
pub trait Bindable {
    fn resource(&self) -> wgpu::BindingResource<'_>;
}

pub struct BindGroupBuilder<'a> {
    label: String,
    resources: Vec<wgpu::BindingResource<'a>>,
}

impl<'a> BindGroupBuilder<'a> {
    pub fn new(label: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            resources: Default::default(),
        }
    }

    pub fn add(mut self, item: &'a dyn Bindable) -> Self {
        self.resources.push(item.resource());
        self
    }

    pub fn build(
        self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        let label = format!("lightbake_{}", self.label);

        let entries: Vec<_> = self
            .resources
            .into_iter()
            .enumerate()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: binding as _,
                resource,
            })
            .collect();

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&label),
            layout,
            entries: &entries,
        })
    }
}
