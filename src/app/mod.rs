pub(crate) mod group;
pub(crate) mod pipeline;
pub(crate) mod report;
pub(crate) mod suite;

use crate::configuration::command_line::Opt;
use crate::configuration::settings::Settings;
use crate::error::CheckError;
use crate::scenario::{Scenario, ScenarioCx, Target};
use crate::sut::{SharedChild, SutHandle};
use self::group::Liveness;
use self::pipeline::GradingPipeline;
use reqwest::blocking::Client;
use std::io;
use std::process;

pub struct App {
    options: Opt,
    settings: Settings,
}

impl App {
    pub fn new(options: Opt, settings: Settings) -> Self {
        App { options, settings }
    }

    pub fn run(&self, slot: SharedChild) -> Result<(), CheckError> {
        let port = self.port();
        let target = Target::new(&self.options.host, port);
        let target6 = Target::new(&self.options.host6, port);
        let pipeline = GradingPipeline::build(&target, &target6);

        if self.options.list {
            for suite in pipeline.suites().iter() {
                println!("In: {}", suite.name);
                for group in suite.groups() {
                    for scenario in group.scenarios() {
                        println!("\t{}", scenario.name);
                    }
                }
            }
            return Ok(());
        }

        let server = self.options.server.as_ref().ok_or_else(|| {
            CheckError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no server executable given; pass --server <path>",
            ))
        })?;

        // the handle owns the subprocess for the rest of the run; its
        // drop terminates the server on every exit path, unwinds included
        let mut sut = SutHandle::launch(slot, server, port, self.options.output.as_ref())?;
        sut.wait_ready(&target.host, &self.settings).map_err(|error| {
            error!(
                "The server is not responding to connection requests and may not be \
                 functioning properly"
            );
            error
        })?;
        info!("The server has started successfully. Now to begin testing.");

        let client = Client::builder()
            .timeout(self.settings.read_timeout)
            .build()
            .map_err(|error| CheckError::Connect(error.to_string()))?;
        let cx = ScenarioCx {
            settings: &self.settings,
            client: &client,
        };

        match &self.options.test {
            Some(name) => self.run_single(name, &pipeline, &cx, &mut sut),
            None => {
                let result = pipeline.run(&cx, &mut sut);
                report::print_points(&result);
                Ok(())
            }
        }
    }

    fn run_single(
        &self,
        name: &str,
        pipeline: &GradingPipeline,
        cx: &ScenarioCx,
        sut: &mut SutHandle,
    ) -> Result<(), CheckError> {
        let scenario = self.find_scenario(name, pipeline).ok_or_else(|| {
            CheckError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("the test \"{}\" was not found; use --list", name),
            ))
        })?;
        let outcome = scenario.execute(cx);
        if !sut.is_alive() {
            warn!("The server has crashed after servicing {}. Please investigate.", name);
        }
        if outcome.passed() {
            println!("Test: {} passed!", name);
        } else {
            println!("Test: {} failed.", name);
        }
        Ok(())
    }

    fn find_scenario<'a>(&self, name: &str, pipeline: &'a GradingPipeline) -> Option<&'a Scenario> {
        pipeline
            .suites()
            .iter()
            .flat_map(|suite| suite.groups())
            .flat_map(|group| group.scenarios())
            .find(|scenario| scenario.name == name)
    }

    fn port(&self) -> u16 {
        self.options
            .port
            .unwrap_or_else(|| (process::id() % 10_000) as u16 + 20_000)
    }
}
