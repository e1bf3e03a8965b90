//! Patient vitals form and color-coded risk report for WebAssembly.

pub mod form;
pub mod table;

#[cfg(target_arch = "wasm32")]
mod styles;

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use std::rc::Rc;

    use crate::form::{ManualForm, ManualResult};
    use crate::styles;
    use crate::table::{report_table, ReportTable, TableCell};
    use serde_wasm_bindgen::from_value;
    use vitals_core::{
        Gender, PatientIdentity, PatientReport, ReportConfig, ReportMode, RiskAxis, VitalField,
        MAX_FORM_AGE,
    };
    use vitals_predict::{
        predict_manual, predict_upload, report_to_csv, ModelBundle, ModelSet,
        MISSING_UPLOAD_WARNING, UPLOAD_COLUMNS_HINT,
    };
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{
        console, Document, Element, File, FileReader, HtmlInputElement, HtmlSelectElement,
        ProgressEvent, Window,
    };
    use yew::events::{Event, InputEvent};
    use yew::prelude::*;
    use yew::TargetCast;

    #[derive(Clone, Copy, PartialEq)]
    enum InputMode {
        Manual,
        Upload,
    }

    impl InputMode {
        fn label(self) -> &'static str {
            match self {
                InputMode::Manual => "Manual Input",
                InputMode::Upload => "Live/CSV Input",
            }
        }
    }

    #[derive(Properties)]
    pub struct VitalsAppProps {
        pub models: Rc<ModelSet>,
    }

    impl PartialEq for VitalsAppProps {
        fn eq(&self, other: &Self) -> bool {
            Rc::ptr_eq(&self.models, &other.models)
        }
    }

    #[function_component(VitalsApp)]
    fn vitals_app(props: &VitalsAppProps) -> Html {
        use_effect_with((), |_| {
            if let Some(window) = web_sys::window() {
                if let Some(document) = window.document() {
                    if let Err(err) = styles::ensure_styles(&document) {
                        console::error_1(&err);
                    }
                }
            }
            || ()
        });

        let mode = use_state(|| InputMode::Manual);
        let patient = use_state(PatientIdentity::default);
        let include_ideal = use_state(|| false);
        let form = use_state(ManualForm::default);
        let manual_outcome = use_state(|| Option::<ManualResult>::None);
        let upload = use_state(|| Option::<String>::None);

        let config = ReportConfig {
            include_ideal_ranges: *include_ideal,
            ..ReportConfig::default()
        };

        let on_name = {
            let patient = patient.clone();
            let manual_outcome = manual_outcome.clone();
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                let mut next = (*patient).clone();
                next.name = input.value();
                patient.set(next);
                manual_outcome.set(None);
            })
        };

        let on_age = {
            let patient = patient.clone();
            let manual_outcome = manual_outcome.clone();
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                if let Ok(age) = input.value().trim().parse::<u32>() {
                    let mut next = (*patient).clone();
                    next.age = age.min(MAX_FORM_AGE);
                    patient.set(next);
                    manual_outcome.set(None);
                }
            })
        };

        let on_gender = {
            let patient = patient.clone();
            let manual_outcome = manual_outcome.clone();
            Callback::from(move |event: Event| {
                let select: HtmlSelectElement = event.target_unchecked_into();
                if let Ok(gender) = select.value().parse::<Gender>() {
                    let mut next = (*patient).clone();
                    next.gender = gender;
                    patient.set(next);
                    manual_outcome.set(None);
                }
            })
        };

        let on_ideal = {
            let include_ideal = include_ideal.clone();
            let manual_outcome = manual_outcome.clone();
            Callback::from(move |event: Event| {
                let input: HtmlInputElement = event.target_unchecked_into();
                include_ideal.set(input.checked());
                manual_outcome.set(None);
            })
        };

        let mode_controls = [InputMode::Manual, InputMode::Upload]
            .into_iter()
            .map(|option| {
                let checked = *mode == option;
                let mode = mode.clone();
                let onchange = Callback::from(move |_: Event| mode.set(option));
                html! {
                    <label>
                        <input type="radio" name="vitals-mode" {checked} {onchange} />
                        { " " }{ option.label() }
                    </label>
                }
            })
            .collect::<Html>();

        let main = match *mode {
            InputMode::Manual => {
                let on_predict = {
                    let form = form.clone();
                    let patient = patient.clone();
                    let outcome = manual_outcome.clone();
                    let models = props.models.clone();
                    let config = config.clone();
                    Callback::from(move |_: MouseEvent| {
                        let result = form
                            .reading()
                            .and_then(|reading| predict_manual(&models, &patient, reading, &config))
                            .map_err(|err| err.to_string());
                        outcome.set(Some(ManualResult::new(
                            (*patient).clone(),
                            config.clone(),
                            result,
                        )));
                    })
                };
                let current = (*manual_outcome)
                    .as_ref()
                    .and_then(|result| result.current(&patient, &config));
                render_manual(form.clone(), current, on_predict)
            }
            InputMode::Upload => {
                let on_file = {
                    let upload = upload.clone();
                    Callback::from(move |event: Event| {
                        let input: HtmlInputElement = event.target_unchecked_into();
                        let Some(file) = input.files().and_then(|files| files.get(0)) else {
                            upload.set(None);
                            return;
                        };
                        let upload = upload.clone();
                        if let Err(err) = read_file_text(&file, move |text| upload.set(Some(text)))
                        {
                            console::error_1(&err);
                        }
                    })
                };
                let outcome = predict_upload(&props.models, &patient, upload.as_deref(), &config)
                    .map_err(|err| err.to_string());
                render_upload(on_file, outcome)
            }
        };

        html! {
            <div class="vitals-root">
                <aside class="vitals-sidebar">
                    <h2>{"Select Input Mode"}</h2>
                    <div class="vitals-mode" role="radiogroup">{ mode_controls }</div>
                    <h2>{"Patient Information"}</h2>
                    <div class="vitals-field">
                        <label for="patient-name">{"Patient Name"}</label>
                        <input id="patient-name" type="text" value={patient.name.clone()} oninput={on_name} />
                    </div>
                    <div class="vitals-field">
                        <label for="patient-age">{"Age"}</label>
                        <input
                            id="patient-age"
                            type="number"
                            min="0"
                            max={MAX_FORM_AGE.to_string()}
                            value={patient.age.to_string()}
                            oninput={on_age}
                        />
                    </div>
                    <div class="vitals-field">
                        <label for="patient-gender">{"Gender"}</label>
                        <select id="patient-gender" onchange={on_gender}>
                            {
                                for Gender::ALL.iter().map(|gender| html! {
                                    <option value={gender.as_str()} selected={patient.gender == *gender}>
                                        { gender.as_str() }
                                    </option>
                                })
                            }
                        </select>
                    </div>
                    <label class="vitals-toggle">
                        <input type="checkbox" checked={*include_ideal} onchange={on_ideal} />
                        {" Show ideal ranges for age"}
                    </label>
                </aside>
                <section class="vitals-main" aria-live="polite">
                    <h1>{"Patient Monitoring & Vital Prediction System"}</h1>
                    { main }
                </section>
            </div>
        }
    }

    fn render_manual(
        form: UseStateHandle<ManualForm>,
        outcome: Option<&Result<PatientReport, String>>,
        on_predict: Callback<MouseEvent>,
    ) -> Html {
        let fields = VitalField::ALL
            .into_iter()
            .map(|field| {
                let bounds = field.bounds();
                let value = form.value(field).to_string();
                let form = form.clone();
                let oninput = Callback::from(move |event: InputEvent| {
                    let input: HtmlInputElement = event.target_unchecked_into();
                    let mut next = (*form).clone();
                    next.set(field, input.value());
                    form.set(next);
                });
                html! {
                    <div class="vitals-field">
                        <label for={field.column()}>{ field.label() }</label>
                        <input
                            id={field.column()}
                            type="number"
                            min={bounds.min.to_string()}
                            max={bounds.max.to_string()}
                            step={ManualForm::step(field)}
                            {value}
                            {oninput}
                        />
                    </div>
                }
            })
            .collect::<Html>();

        let result = match outcome {
            Some(Ok(report)) => render_report(report),
            Some(Err(message)) => html! { <p class="vitals-error">{ message.clone() }</p> },
            None => Html::default(),
        };

        html! {
            <>
                <section class="vitals-card">
                    <h2>{"Enter Vitals Manually"}</h2>
                    { fields }
                    <button type="button" class="vitals-button" onclick={on_predict}>
                        {"Predict Parameters"}
                    </button>
                </section>
                { result }
            </>
        }
    }

    fn render_upload(
        on_file: Callback<Event>,
        outcome: Result<Option<PatientReport>, String>,
    ) -> Html {
        let result = match outcome {
            Ok(Some(report)) => render_report(&report),
            Ok(None) => html! { <p class="vitals-warning">{ MISSING_UPLOAD_WARNING }</p> },
            Err(message) => html! { <p class="vitals-error">{ message }</p> },
        };

        html! {
            <>
                <section class="vitals-card">
                    <h2>{"Upload CSV from Sensors / Real-Time Data"}</h2>
                    <p class="vitals-hint">{ UPLOAD_COLUMNS_HINT }</p>
                    <input type="file" accept=".csv,text/csv" onchange={on_file} />
                </section>
                { result }
            </>
        }
    }

    fn render_report(report: &PatientReport) -> Html {
        let summary = match (report.mode, report.rows().first()) {
            (ReportMode::Manual, Some(row)) => html! {
                <ul class="risk-summary">
                    {
                        for RiskAxis::ALL.iter().map(|axis| {
                            let label = row.label(*axis);
                            html! {
                                <li>
                                    <strong>{ format!("{}: ", axis.title()) }</strong>
                                    <span class="risk-label" data-level={label.tier().level()}>
                                        { label.to_string() }
                                    </span>
                                </li>
                            }
                        })
                    }
                </ul>
            },
            _ => Html::default(),
        };

        let download = match report_to_csv(report) {
            Ok(csv) => {
                let href = format!(
                    "data:text/csv;charset=utf-8,{}",
                    String::from(js_sys::encode_uri_component(&csv))
                );
                html! {
                    <a class="vitals-download" href={href} download={report.suggested_file_name()}>
                        {"Download Full Report"}
                    </a>
                }
            }
            Err(err) => html! { <p class="vitals-error">{ err.to_string() }</p> },
        };

        html! {
            <section class="vitals-card">
                <h3>{ report.greeting() }</h3>
                { summary }
                { render_table(&report_table(report)) }
                <p class="report-generated">
                    { format!("Generated at {}", report.generated_at.format("%Y-%m-%d %H:%M UTC")) }
                </p>
                { download }
            </section>
        }
    }

    fn render_table(table: &ReportTable) -> Html {
        html! {
            <div class="report-table-wrap">
                <table class="report-table">
                    <thead>
                        <tr>{ for table.headers.iter().map(|header| html! { <th>{ *header }</th> }) }</tr>
                    </thead>
                    <tbody>
                        {
                            for table.rows.iter().map(|row| html! {
                                <tr>{ for row.iter().map(render_cell) }</tr>
                            })
                        }
                    </tbody>
                </table>
            </div>
        }
    }

    fn render_cell(cell: &TableCell) -> Html {
        html! { <td data-level={cell.level}>{ cell.text.clone() }</td> }
    }

    fn read_file_text(
        file: &File,
        on_loaded: impl FnOnce(String) + 'static,
    ) -> Result<(), JsValue> {
        let reader = FileReader::new()?;
        let reader_handle = reader.clone();
        let onload = Closure::once_into_js(move |_event: ProgressEvent| {
            match reader_handle.result() {
                Ok(value) => match value.as_string() {
                    Some(text) => on_loaded(text),
                    None => console::error_1(&JsValue::from_str("Upload is not a text file")),
                },
                Err(err) => console::error_1(&err),
            }
        });
        reader.set_onload(Some(onload.unchecked_ref()));
        reader.read_as_text(file)?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn mount_vitals_app(selector: &str, models: JsValue) -> Result<(), JsValue> {
        let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Could not access document"))?;

        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Selector error: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("No element matches the selector"))?;

        let bundle: ModelBundle = from_value(models)?;
        bundle
            .validate()
            .map_err(|err| JsValue::from_str(&format!("Invalid model bundle: {err}")))?;

        yew::Renderer::<VitalsApp>::with_root_and_props(
            target,
            VitalsAppProps {
                models: Rc::new(ModelSet::from(bundle)),
            },
        )
        .render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::mount_vitals_app;

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_vitals_app(_: &str, _: wasm_bindgen::JsValue) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "vitals-ui only supports the wasm32 target",
    ))
}
