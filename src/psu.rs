use crate::{
    accessor::{RegisterAccessor, RetryPolicy},
    config::SessionConfig,
    error::{Error, Result},
    model::{self, DeviceIdentity, ScaleFactors, ScaleProfile},
    quantity::{Quantity, from_physical},
    register::{ControlMode, ProtectionStatus, State, TemperatureProbe, TemperatureUnit},
    transport::Transport,
};

/// A session with one PSU. You can create a RdPsu using any [`Transport`].
///
/// Creating the session probes the device once for its identity and scale profile. Both are
/// kept for the lifetime of the session, so a different PSU on the same port needs a new
/// session.
///
/// For it's methods, we generally use the nomenclature that "set" meant to write a configuration and "get" means to read
/// back a configuration value. Where as "read" means to get a measured value.
///
/// The session owns its transport and every bus operation takes `&mut self`. Sharing one PSU
/// between threads needs an outer lock.
pub struct RdPsu<T: Transport> {
    accessor: RegisterAccessor<T>,
    identity: DeviceIdentity,
    profile: ScaleProfile,
}

impl<T: Transport> RdPsu<T> {
    /// Open a session with the default retry policy.
    pub fn new(transport: T) -> Result<Self, T::Error> {
        Self::with_retry_policy(transport, RetryPolicy::default())
    }

    /// Open a session with the retry policy from `config`.
    pub fn from_config(transport: T, config: &SessionConfig) -> Result<Self, T::Error> {
        Self::with_retry_policy(transport, config.retry)
    }

    /// Open a session with a custom retry policy.
    pub fn with_retry_policy(transport: T, policy: RetryPolicy) -> Result<Self, T::Error> {
        let mut accessor = RegisterAccessor::new(transport, policy);
        let identity = model::identify(&mut accessor)?;
        Ok(Self {
            accessor,
            identity,
            profile: identity.scale_profile(),
        })
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn scale_profile(&self) -> ScaleProfile {
        self.profile
    }

    pub fn scale_factors(&self) -> ScaleFactors {
        self.profile.factors()
    }

    /// Close the session and give back the transport.
    pub fn into_transport(self) -> T {
        self.accessor.into_transport()
    }

    pub(crate) fn accessor(&mut self) -> &mut RegisterAccessor<T> {
        &mut self.accessor
    }

    /// Read a quantity as its raw register value, with the sign applied.
    pub fn read_raw(&mut self, quantity: Quantity) -> Result<i64, T::Error> {
        let spec = quantity.spec();
        if spec.span() == 1 {
            return Ok(i64::from(self.accessor.read_one(spec.address)?));
        }
        let start = spec.first_address();
        let mut buf = [0u16; 2];
        let window = &mut buf[..spec.span()];
        self.accessor.read_many(start, window)?;
        spec.decode_raw(window, start).ok_or(Error::InvalidResponse)
    }

    /// Read a quantity in physical units.
    pub fn read(&mut self, quantity: Quantity) -> Result<f64, T::Error> {
        let raw = self.read_raw(quantity)?;
        let divisor = quantity.spec().scale.divisor(self.scale_factors());
        Ok(crate::quantity::to_physical(raw, divisor))
    }

    /// Write a quantity as a raw register value.
    pub fn write_raw(&mut self, quantity: Quantity, raw: u16) -> Result<(), T::Error> {
        let spec = quantity.spec();
        if !spec.is_writable() {
            return Err(Error::ReadOnly(spec.address));
        }
        log::debug!("write {} = {}", quantity.name(), raw);
        self.accessor.write_one(spec.address, raw)
    }

    /// Write a quantity in physical units, rounded to the nearest register step.
    pub fn write(&mut self, quantity: Quantity, value: f64) -> Result<(), T::Error> {
        let spec = quantity.spec();
        if !spec.is_writable() {
            return Err(Error::ReadOnly(spec.address));
        }
        let divisor = spec.scale.divisor(self.scale_factors());
        let raw = from_physical(value, divisor).ok_or(Error::InvalidRange)?;
        self.write_raw(quantity, raw)
    }

    /// Set the output target voltage in volts.
    pub fn set_voltage(&mut self, volts: f64) -> Result<(), T::Error> {
        self.write(Quantity::SetVoltage, volts)
    }

    /// Get the output target voltage in volts.
    pub fn get_voltage(&mut self) -> Result<f64, T::Error> {
        self.read(Quantity::SetVoltage)
    }

    /// Set the output current limit in amps.
    pub fn set_current(&mut self, amps: f64) -> Result<(), T::Error> {
        self.write(Quantity::SetCurrent, amps)
    }

    /// Get the output current limit in amps.
    pub fn get_current(&mut self) -> Result<f64, T::Error> {
        self.read(Quantity::SetCurrent)
    }

    /// Return the measured output voltage in volts.
    pub fn read_output_voltage(&mut self) -> Result<f64, T::Error> {
        self.read(Quantity::OutputVoltage)
    }

    /// Return the measured output current in amps.
    pub fn read_output_current(&mut self) -> Result<f64, T::Error> {
        self.read(Quantity::OutputCurrent)
    }

    /// Return the measured output power in watts.
    pub fn read_output_power(&mut self) -> Result<f64, T::Error> {
        self.read(Quantity::OutputPower)
    }

    /// Return the measured supply input voltage in volts.
    pub fn read_input_voltage(&mut self) -> Result<f64, T::Error> {
        self.read(Quantity::InputVoltage)
    }

    /// Return a measured temperature in whole degrees.
    pub fn read_temperature(
        &mut self,
        probe: TemperatureProbe,
        unit: TemperatureUnit,
    ) -> Result<i64, T::Error> {
        use TemperatureProbe::{External, Internal};
        use TemperatureUnit::{Celsius, Fahrenheit};

        let quantity = match (probe, unit) {
            (Internal, Celsius) => Quantity::InternalTemperature,
            (Internal, Fahrenheit) => Quantity::InternalTemperatureFahrenheit,
            (External, Celsius) => Quantity::ExternalTemperature,
            (External, Fahrenheit) => Quantity::ExternalTemperatureFahrenheit,
        };
        self.read_raw(quantity)
    }

    /// Enable/disable the output.
    pub fn set_output_state(&mut self, state: impl Into<State>) -> Result<(), T::Error> {
        self.write_raw(Quantity::OutputEnable, state.into() as u16)
    }

    /// Read whether the output is enabled or disabled.
    pub fn get_output_state(&mut self) -> Result<State, T::Error> {
        let value = self.read_raw(Quantity::OutputEnable)?;
        Ok(State::from(value != 0))
    }

    /// Get the currently active control mode. (CV or CC.)
    pub fn get_control_mode(&mut self) -> Result<ControlMode, T::Error> {
        let value = self.read_raw(Quantity::ControlMode)?;
        Ok(ControlMode::from(value as u16))
    }

    /// Return which protection has been triggered, if any.
    pub fn get_protection_status(&mut self) -> Result<ProtectionStatus, T::Error> {
        let value = self.read_raw(Quantity::ProtectionStatus)?;
        Ok(ProtectionStatus::from(value as u16))
    }

    /// Set the backlight brightness level.
    pub fn set_backlight(&mut self, level: u16) -> Result<(), T::Error> {
        self.write_raw(Quantity::Backlight, level)
    }

    /// Get the current backlight brightness level.
    pub fn get_backlight(&mut self) -> Result<u16, T::Error> {
        let value = self.read_raw(Quantity::Backlight)?;
        Ok(value as u16)
    }

    /// Set the over-voltage protection level in volts.
    pub fn set_voltage_protection(&mut self, volts: f64) -> Result<(), T::Error> {
        self.write(Quantity::OverVoltageProtection, volts)
    }

    /// Set the over-current protection level in amps.
    pub fn set_current_protection(&mut self, amps: f64) -> Result<(), T::Error> {
        self.write(Quantity::OverCurrentProtection, amps)
    }
}
