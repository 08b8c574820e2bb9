// Demo data the store starts with: leads, objections, project resources and
// calendar events.

use chrono::{Datelike, Days, NaiveDate};

use crate::model::{
    CalendarEvent, Lead, Message, Objection, ProjectResource, ResourceKind, Sender, Temperature,
    DEFAULT_OWNER,
};

struct SeedLead {
    id: u64,
    name: &'static str,
    project: &'static str,
    temperature: Temperature,
    persona: &'static str,
    conversation: &'static [(Sender, &'static str, &'static str)],
    email: &'static str,
    stage: &'static str,
    tags: &'static [&'static str],
}

impl SeedLead {
    fn build(self) -> Lead {
        Lead {
            id: self.id,
            name: self.name.to_string(),
            project: self.project.to_string(),
            temperature: self.temperature,
            persona: self.persona.to_string(),
            conversation: self
                .conversation
                .iter()
                .enumerate()
                .map(|(i, (sender, text, ts))| Message {
                    id: i as u64 + 1,
                    sender: *sender,
                    text: text.to_string(),
                    timestamp: ts.to_string(),
                })
                .collect(),
            job_title: None,
            company: None,
            phone: None,
            email: Some(self.email.to_string()),
            stage: Some(self.stage.to_string()),
            owner: None,
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

fn with_contact(mut lead: Lead, job_title: &str, company: &str, phone: &str) -> Lead {
    lead.job_title = Some(job_title.to_string());
    lead.company = Some(company.to_string());
    lead.phone = Some(phone.to_string());
    lead.owner = Some(DEFAULT_OWNER.to_string());
    lead
}

pub fn initial_leads() -> Vec<Lead> {
    use Sender::{Agent, Lead as L};
    use Temperature::{Cold, Hot, Warm};

    let ana = SeedLead {
        id: 1,
        name: "Ana García",
        project: "Vistas del Parque",
        temperature: Warm,
        persona: "Pareja joven, buscando su primer departamento. Valoran la luz natural, la seguridad y espacios para mascotas. Presupuesto moderado.",
        conversation: &[
            (L, "Hola, vi el proyecto \"Vistas del Parque\" y me interesó mucho. ¿Podrían darme más información?", "10:00 AM"),
            (Agent, "¡Hola Ana! Claro que sí. \"Vistas del Parque\" es ideal para parejas jóvenes. ¿Qué es lo que más te llamó la atención?", "10:02 AM"),
            (L, "Las áreas verdes y la ubicación. El espacio se ve bien en las fotos, pero me cuesta imaginar cómo quedarían mis muebles... Tengo un sofá en forma de L muy grande.", "10:05 AM"),
        ],
        email: "ana.garcia@email.com",
        stage: "Calificado",
        tags: &["primer_hogar", "diseño"],
    };
    let carlos = SeedLead {
        id: 2,
        name: "Carlos Rodríguez",
        project: "Residencial Céntrico",
        temperature: Hot,
        persona: "Inversionista experimentado. Busca propiedades con alta plusvalía y buen retorno de alquiler. Se enfoca en los números y datos duros.",
        conversation: &[(L, "Información sobre Residencial Céntrico. Retorno de inversión estimado?", "Ayer")],
        email: "carlos.r@email.com",
        stage: "Negociación",
        tags: &["inversionista", "alta_rentabilidad"],
    };
    let sofia = SeedLead {
        id: 3,
        name: "Sofía Martinez",
        project: "Loft Urbano",
        temperature: Cold,
        persona: "Profesional soltera. Busca un espacio moderno y bien conectado. Es muy sensible al precio y ya ha visto otras 5 opciones.",
        conversation: &[(L, "Me gustó el Loft, pero el precio me parece un poco alto.", "Hace 2 días")],
        email: "sofia.m@email.com",
        stage: "Contactado",
        tags: &["sensible_al_precio", "loft"],
    };

    let mut leads = vec![
        with_contact(ana.build(), "Diseñadora Gráfica", "Creativos Asociados", "+51 987 654 321"),
        with_contact(carlos.build(), "Director de Inversiones", "Capital Futuro", "+51 912 345 678"),
        with_contact(sofia.build(), "Analista de Marketing", "Tech Solutions", "+51 998 877 665"),
    ];

    let rest = [
        SeedLead {
            id: 4,
            name: "Mateo Quispe",
            project: "Terrazas de San Borja",
            temperature: Hot,
            persona: "Familia joven con un hijo pequeño. Buscan seguridad, parques cercanos y un departamento de 3 dormitorios.",
            conversation: &[(L, "Hola, ¿el proyecto en San Borja tiene áreas de juegos para niños?", "11:30 AM")],
            email: "mateo.quispe@email.com",
            stage: "Propuesta",
            tags: &["familia", "3_dormitorios"],
        },
        SeedLead {
            id: 5,
            name: "Camila Flores",
            project: "Miraflores Oceanic",
            temperature: Warm,
            persona: "Profesional joven, trabaja desde casa. Valora una buena conexión a internet, un espacio para oficina y vista al mar.",
            conversation: &[(L, "¿Los departamentos en Miraflores tienen balcón?", "02:15 PM")],
            email: "camila.f@email.com",
            stage: "Calificado",
            tags: &["home_office", "vista_al_mar"],
        },
        SeedLead {
            id: 6,
            name: "Santiago Rojas",
            project: "Altos de La Molina",
            temperature: Cold,
            persona: "Busca una casa grande con jardín. Su presupuesto es limitado y está preocupado por el tráfico de la zona.",
            conversation: &[(L, "El precio por metro cuadrado en La Molina es negociable?", "Hace 3 días")],
            email: "santiago.rojas@email.com",
            stage: "Contactado",
            tags: &["presupuesto_ajustado", "casa_con_jardin"],
        },
        SeedLead {
            id: 7,
            name: "Luciana Mendoza",
            project: "Barranco Bohemio Lofts",
            temperature: Hot,
            persona: "Artista plástica. Busca un espacio con mucha luz, techos altos y un ambiente inspirador cerca de galerías de arte.",
            conversation: &[(L, "¡Me encanta! ¿Cuándo puedo visitar el loft piloto?", "09:00 AM")],
            email: "luciana.m@email.com",
            stage: "Negociación",
            tags: &["artista", "techos_altos"],
        },
        SeedLead {
            id: 8,
            name: "Nicolás Castillo",
            project: "San Isidro Golf Suites",
            temperature: Hot,
            persona: "Empresario, busca un pied-à-terre de lujo para sus viajes de negocios a Lima. Valora la exclusividad y los acabados premium.",
            conversation: &[(L, "Enviar catálogo de acabados y especificaciones técnicas.", "Ayer")],
            email: "nicolas.castillo@email.com",
            stage: "Propuesta",
            tags: &["lujo", "inversionista_extranjero"],
        },
        SeedLead {
            id: 9,
            name: "Valentina Torres",
            project: "Parque Surco Living",
            temperature: Warm,
            persona: "Pareja de recién casados. Buscan un lugar tranquilo, con buena distribución y cerca al trabajo de ambos.",
            conversation: &[(L, "¿Qué opciones de financiamiento ofrecen?", "04:00 PM")],
            email: "valentina.t@email.com",
            stage: "Calificado",
            tags: &["recien_casados", "tranquilidad"],
        },
        SeedLead {
            id: 10,
            name: "Sebastián Soto",
            project: "Lince Moderno",
            temperature: Cold,
            persona: "Joven profesional, muy analítico. Ha comparado 10 proyectos y busca la mejor oferta en relación calidad-precio.",
            conversation: &[(L, "Tengo una mejor oferta de otro proyecto. ¿Pueden igualarla?", "Hace 5 días")],
            email: "sebastian.soto@email.com",
            stage: "Contactado",
            tags: &["analitico", "sensible_al_precio"],
        },
        SeedLead {
            id: 11,
            name: "Isabella Vargas",
            project: "Pueblo Libre Tradición",
            temperature: Warm,
            persona: "Busca un departamento para sus padres mayores. Prioriza la accesibilidad, primer piso y cercanía a clínicas y mercados.",
            conversation: &[(L, "¿El edificio cuenta con rampas y ascensores anchos?", "01:20 PM")],
            email: "isabella.v@email.com",
            stage: "Calificado",
            tags: &["tercera_edad", "accesibilidad"],
        },
        SeedLead {
            id: 12,
            name: "Alejandro Romero",
            project: "Magdalena del Mar Premium",
            temperature: Hot,
            persona: "Expatriado que regresa a Perú. Busca un departamento moderno, seguro y con amenidades como gimnasio y piscina.",
            conversation: &[(L, "Perfecto, agendemos una videollamada para ver los planos.", "10:45 AM")],
            email: "alejandro.r@email.com",
            stage: "Propuesta",
            tags: &["expatriado", "amenidades"],
        },
        SeedLead {
            id: 13,
            name: "Valeria Chávez",
            project: "Jesús María Conecta",
            temperature: Warm,
            persona: "Estudiante universitaria. Sus padres le comprarán un departamento. Busca algo cerca de su universidad y de zonas comerciales.",
            conversation: &[(L, "¿A cuántas cuadras está del Real Plaza Salaverry?", "06:00 PM")],
            email: "valeria.chavez@email.com",
            stage: "Calificado",
            tags: &["estudiante", "inversion_familiar"],
        },
        SeedLead {
            id: 14,
            name: "Diego Paredes",
            project: "Chorrillos Costa Verde",
            temperature: Cold,
            persona: "Amante del surf. Quiere vivir cerca a la playa pero no está seguro si Chorrillos es la mejor opción para él.",
            conversation: &[(L, "He escuchado que el tráfico por ahí es complicado.", "Hace 1 semana")],
            email: "diego.p@email.com",
            stage: "Contactado",
            tags: &["surfista", "dudas_ubicacion"],
        },
        SeedLead {
            id: 15,
            name: "Sofía Díaz",
            project: "San Miguel Parkside",
            temperature: Warm,
            persona: "Joven profesional que busca independizarse. Presupuesto limitado, busca un departamento pequeño pero funcional y bien ubicado.",
            conversation: &[(L, "¿Cuál es el departamento más económico que tienen disponible?", "12:00 PM")],
            email: "sofia.diaz@email.com",
            stage: "Calificado",
            tags: &["primer_hogar", "presupuesto_limitado"],
        },
        SeedLead {
            id: 16,
            name: "Gabriel Herrera",
            project: "Residencial San Luis",
            temperature: Hot,
            persona: "Pequeño empresario que busca invertir sus ahorros en un inmueble para alquilar. Se enfoca en la rentabilidad.",
            conversation: &[(L, "¿Cuál es el precio promedio de alquiler en la zona para un dpto de 2 habitaciones?", "Ayer")],
            email: "gabriel.h@email.com",
            stage: "Propuesta",
            tags: &["inversionista", "rentabilidad_alquiler"],
        },
        SeedLead {
            id: 17,
            name: "Andrea Guzmán",
            project: "Ate Vitarte Futuro",
            temperature: Cold,
            persona: "Familia en crecimiento. Buscan una opción económica con potencial de crecimiento a futuro, aunque esté más alejado.",
            conversation: &[(L, "Estamos viendo opciones, aún no nos decidimos. Gracias.", "Hace 4 días")],
            email: "andrea.guzman@email.com",
            stage: "Contactado",
            tags: &["familia_joven", "buscando_precio"],
        },
        SeedLead {
            id: 18,
            name: "José Fernández",
            project: "El Agustino Mirador",
            temperature: Warm,
            persona: "Obrero calificado buscando acceder a un crédito de vivienda social. Necesita asesoría con los trámites.",
            conversation: &[(L, "¿Ustedes ayudan con el trámite del crédito MiVivienda?", "03:30 PM")],
            email: "jose.fernandez@email.com",
            stage: "Calificado",
            tags: &["credito_social", "asesoria"],
        },
    ];
    leads.extend(rest.into_iter().map(SeedLead::build));
    leads
}

pub fn initial_objections() -> Vec<Objection> {
    vec![
        Objection {
            id: 1,
            title: "Precio elevado".into(),
            arguments: vec![
                "Entiendo tu perspectiva. Hablemos del valor a largo plazo y la plusvalía de la zona, que ha crecido un 15% anual.".into(),
                "Si comparamos los acabados y amenidades con otros proyectos, verás que nuestra relación calidad-precio es superior.".into(),
                "Podemos explorar diferentes esquemas de financiamiento que pueden hacer la mensualidad mucho más cómoda para ti.".into(),
            ],
        },
        Objection {
            id: 2,
            title: "Espacio pequeño".into(),
            arguments: vec![
                "La clave está en la distribución inteligente. Cada metro cuadrado está diseñado para ser funcional y versátil. ¿Viste el área de almacenamiento integrada?".into(),
                "Muchos de nuestros clientes se sorprenden de lo espacioso que se siente una vez amueblado. Podemos usar el \"Visualizador de Sueños\" para que te hagas una idea.".into(),
                "El diseño de doble altura y los ventanales amplios crean una sensación de amplitud mucho mayor al metraje real.".into(),
            ],
        },
        Objection {
            id: 3,
            title: "Competencia cercana".into(),
            arguments: vec![
                "Es cierto, hay más opciones, lo cual valida que esta es una excelente zona para invertir. Sin embargo, nuestro proyecto es el único con certificación LEED, lo que reduce costos de mantenimiento.".into(),
                "A diferencia de otros, nosotros ofrecemos 2 años de mantenimiento incluido y acceso exclusivo al club deportivo. Es un paquete de valor completo.".into(),
            ],
        },
    ]
}

pub fn initial_resources() -> Vec<ProjectResource> {
    use ResourceKind::*;
    let rows: [(&str, &str, ResourceKind); 12] = [
        ("Vistas del Parque", "Carpeta Principal", Folder),
        ("Vistas del Parque", "Brochure Oficial 2024.pdf", Pdf),
        ("Vistas del Parque", "Lista de Precios Q3.xlsx", Xlsx),
        ("Residencial Céntrico", "Carpeta Principal", Folder),
        ("Residencial Céntrico", "Análisis de Rentabilidad.pdf", Pdf),
        ("Loft Urbano", "Carpeta Principal", Folder),
        ("Loft Urbano", "Comparativa de Mercado.docx", Docx),
        ("Loft Urbano", "Planos y Acabados.pdf", Pdf),
        ("Terrazas de San Borja", "Brochure Familias.pdf", Pdf),
        ("Miraflores Oceanic", "Vistas y Planos.pdf", Pdf),
        ("Barranco Bohemio Lofts", "Carpeta de Arte y Diseño.pdf", Pdf),
        ("San Isidro Golf Suites", "Catálogo de Lujo.pdf", Pdf),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (project, name, kind))| ProjectResource {
            id: i as u64 + 1,
            project: project.to_string(),
            name: name.to_string(),
            url: "https://drive.google.com".to_string(),
            kind,
        })
        .collect()
}

/// Calendar events relative to `today`: two fixed June dates in the current
/// year, one three days ahead and one on the first of the current month.
pub fn initial_events(today: NaiveDate) -> Vec<CalendarEvent> {
    let year = today.year();
    let june = |day| NaiveDate::from_ymd_opt(year, 6, day).unwrap_or(today);
    let in_three_days = today.checked_add_days(Days::new(3)).unwrap_or(today);
    let month_start = today.with_day(1).unwrap_or(today);

    vec![
        CalendarEvent {
            id: 1,
            date: june(22),
            title: "Día de Puertas Abiertas".into(),
            description: "Proyecto \"Vistas del Parque\"".into(),
            time: "10:00 AM - 4:00 PM".into(),
        },
        CalendarEvent {
            id: 2,
            date: june(24),
            title: "Reunión Semanal de Equipo".into(),
            description: "Oficina central".into(),
            time: "9:00 AM".into(),
        },
        CalendarEvent {
            id: 3,
            date: in_three_days,
            title: "Firma de Contrato - Familia López".into(),
            description: "Notaría Pública No. 12".into(),
            time: "11:30 AM".into(),
        },
        CalendarEvent {
            id: 4,
            date: month_start,
            title: "Cierre de Metas Mensuales".into(),
            description: "Revisión de KPIs del equipo".into(),
            time: "5:00 PM".into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_leads_have_unique_ids() {
        let leads = initial_leads();
        assert_eq!(leads.len(), 18);
        let ids: HashSet<_> = leads.iter().map(|l| l.id).collect();
        assert_eq!(ids.len(), leads.len());
    }

    #[test]
    fn seed_conversations_are_numbered_from_one() {
        for lead in initial_leads() {
            for (i, msg) in lead.conversation.iter().enumerate() {
                assert_eq!(msg.id, i as u64 + 1, "lead {}", lead.name);
            }
        }
    }

    #[test]
    fn first_three_leads_carry_contact_details() {
        let leads = initial_leads();
        assert_eq!(leads[0].company.as_deref(), Some("Creativos Asociados"));
        assert_eq!(leads[2].owner.as_deref(), Some(DEFAULT_OWNER));
        assert!(leads[3].owner.is_none());
    }

    #[test]
    fn events_relative_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let events = initial_events(today);
        assert_eq!(events[0].date, NaiveDate::from_ymd_opt(2026, 6, 22).unwrap());
        assert_eq!(events[2].date, NaiveDate::from_ymd_opt(2026, 10, 22).unwrap());
        assert_eq!(events[3].date, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
    }
}
