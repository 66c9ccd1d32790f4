use crate::ids::DeviceId;

pub trait DeviceIdentityPort: Send + Sync {
    fn current_device_id(&self) -> DeviceId;
}

#[cfg(test)]
mockall::mock! {
    pub DeviceIdentity {}

    impl DeviceIdentityPort for DeviceIdentity {
        fn current_device_id(&self) -> DeviceId;
    }
}
