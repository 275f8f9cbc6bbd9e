//! Bounded per-employee recalculation pool.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{EmployeeRange, RangeCalculation, calculate_range};
use crate::config::{ConfigLoader, DayPlanTable, RecalculationSettings};
use crate::error::{EngineError, EngineResult};

/// How one employee's range ended.
#[derive(Debug, Clone)]
pub enum EmployeeRunStatus {
    /// Every date was attempted. Individual dates may still have failed.
    Completed(RangeCalculation),
    /// The range itself was rejected before any date ran.
    Failed(EngineError),
    /// The run was cancelled before this employee started.
    Cancelled,
    /// The worker calculating this employee stopped unexpectedly.
    Aborted {
        /// What happened to the worker.
        message: String,
    },
}

impl EmployeeRunStatus {
    /// Returns the range calculation of a completed employee.
    pub fn calculation(&self) -> Option<&RangeCalculation> {
        match self {
            EmployeeRunStatus::Completed(calculation) => Some(calculation),
            _ => None,
        }
    }
}

/// One employee's entry in a [`RecalculationReport`].
#[derive(Debug, Clone)]
pub struct EmployeeReport {
    /// The employee.
    pub employee_id: String,
    /// How the employee's range ended.
    pub status: EmployeeRunStatus,
}

/// The outcome of a recalculation run, in submission order.
#[derive(Debug, Clone)]
pub struct RecalculationReport {
    /// Correlation id of the run, also present in its log events.
    pub run_id: Uuid,
    /// One entry per submitted employee.
    pub employees: Vec<EmployeeReport>,
}

impl RecalculationReport {
    /// Returns the report entry for `employee_id`.
    pub fn employee(&self, employee_id: &str) -> Option<&EmployeeReport> {
        self.employees
            .iter()
            .find(|report| report.employee_id == employee_id)
    }

    /// Number of employees whose range completed.
    pub fn completed_count(&self) -> usize {
        self.employees
            .iter()
            .filter(|report| matches!(report.status, EmployeeRunStatus::Completed(_)))
            .count()
    }

    /// Number of employees skipped by cancellation.
    pub fn cancelled_count(&self) -> usize {
        self.employees
            .iter()
            .filter(|report| matches!(report.status, EmployeeRunStatus::Cancelled))
            .count()
    }
}

/// Recalculates employee ranges concurrently.
///
/// At most `max_workers` employees are calculated at the same time. Each
/// employee's dates run sequentially on a blocking task; different employees
/// never share state.
///
/// # Example
///
/// ```no_run
/// use workday_engine::config::ConfigLoader;
/// use workday_engine::recalculation::Recalculator;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> workday_engine::error::EngineResult<()> {
/// let recalculator = Recalculator::from_config(ConfigLoader::load("./config/default")?);
/// let report = recalculator.run(vec![], CancellationToken::new()).await?;
/// assert_eq!(report.employees.len(), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Recalculator {
    plans: Arc<DayPlanTable>,
    settings: RecalculationSettings,
}

impl Recalculator {
    /// Creates a recalculator over a plan table.
    pub fn new(plans: Arc<DayPlanTable>, settings: RecalculationSettings) -> Self {
        Self { plans, settings }
    }

    /// Creates a recalculator from loaded configuration.
    pub fn from_config(config: ConfigLoader) -> Self {
        let settings = config.settings().recalculation;
        Self::new(Arc::new(config.into_plans()), settings)
    }

    /// Returns the plan table the recalculator uses.
    pub fn plans(&self) -> &DayPlanTable {
        &self.plans
    }

    /// Runs every employee range and waits for all of them.
    ///
    /// Cancellation is checked before an employee starts; employees already
    /// calculating finish their range. Fails up front with
    /// [`EngineError::DuplicateEmployee`] when an employee is submitted twice.
    pub async fn run(
        &self,
        employees: Vec<EmployeeRange>,
        cancel: CancellationToken,
    ) -> EngineResult<RecalculationReport> {
        let mut seen = HashSet::with_capacity(employees.len());
        for range in &employees {
            if !seen.insert(range.employee_id.as_str()) {
                return Err(EngineError::DuplicateEmployee {
                    employee_id: range.employee_id.clone(),
                });
            }
        }

        let run_id = Uuid::new_v4();
        let max_workers = self.settings.max_workers.max(1);
        info!(
            %run_id,
            employees = employees.len(),
            max_workers,
            "Starting recalculation run"
        );

        let semaphore = Arc::new(Semaphore::new(max_workers));
        let employee_ids: Vec<String> = employees
            .iter()
            .map(|range| range.employee_id.clone())
            .collect();
        let mut tasks = JoinSet::new();

        for (index, range) in employees.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let plans = Arc::clone(&self.plans);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let Some(permit) = permit else {
                    debug!(%run_id, employee_id = %range.employee_id, "Employee skipped");
                    return (index, EmployeeRunStatus::Cancelled);
                };
                if cancel.is_cancelled() {
                    return (index, EmployeeRunStatus::Cancelled);
                }

                let employee_id = range.employee_id.clone();
                let joined =
                    tokio::task::spawn_blocking(move || calculate_range(&range, &plans)).await;
                drop(permit);

                let status = match joined {
                    Ok(Ok(calculation)) => {
                        debug!(
                            %run_id,
                            employee_id = %employee_id,
                            dates = calculation.days.len(),
                            "Employee range calculated"
                        );
                        EmployeeRunStatus::Completed(calculation)
                    }
                    Ok(Err(error)) => {
                        warn!(%run_id, employee_id = %employee_id, error = %error, "Employee range rejected");
                        EmployeeRunStatus::Failed(error)
                    }
                    Err(join_error) => {
                        warn!(%run_id, employee_id = %employee_id, error = %join_error, "Employee worker aborted");
                        EmployeeRunStatus::Aborted {
                            message: join_error.to_string(),
                        }
                    }
                };
                (index, status)
            });
        }

        let mut statuses: Vec<Option<EmployeeRunStatus>> = vec![None; employee_ids.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, status)) => statuses[index] = Some(status),
                Err(join_error) => {
                    warn!(%run_id, error = %join_error, "Recalculation task failed");
                }
            }
        }

        let employees: Vec<EmployeeReport> = employee_ids
            .into_iter()
            .zip(statuses)
            .map(|(employee_id, status)| EmployeeReport {
                employee_id,
                status: status.unwrap_or_else(|| EmployeeRunStatus::Aborted {
                    message: "recalculation task failed".to_string(),
                }),
            })
            .collect();

        let report = RecalculationReport { run_id, employees };
        info!(
            %run_id,
            completed = report.completed_count(),
            cancelled = report.cancelled_count(),
            "Finished recalculation run"
        );
        Ok(report)
    }
}
